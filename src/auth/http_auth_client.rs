use crate::auth::{Auth, AuthIdentity};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

pub struct HttpAuthClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
}

impl HttpAuthClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the auth HTTP client.")?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
        })
    }
}

#[derive(serde::Deserialize)]
struct UserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[async_trait]
impl Auth for HttpAuthClient {
    #[tracing::instrument(name = "Resolve an access token", skip_all)]
    async fn current_user(
        &self,
        access_token: &Secret<String>,
    ) -> Result<Option<AuthIdentity>, anyhow::Error> {
        let response = self
            .http_client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(access_token.expose_secret())
            .send()
            .await
            .context("Failed to reach the auth provider.")?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
        ) {
            return Ok(None);
        }

        let user: UserResponse = response
            .error_for_status()
            .context("The auth provider rejected the request.")?
            .json()
            .await
            .context("Failed to parse the auth provider's response.")?;

        Ok(Some(AuthIdentity {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }))
    }
}
