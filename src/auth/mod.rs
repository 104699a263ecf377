mod http_auth_client;

use async_trait::async_trait;
pub use http_auth_client::HttpAuthClient;
use secrecy::Secret;
use uuid::Uuid;

/// A user as known to the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub email: String,
}

/// The hosted authentication provider. Sign-up, sign-in and password flows
/// happen between clients and the provider; this service only resolves
/// access tokens.
#[async_trait]
pub trait Auth: Send + Sync {
    /// `None` when the token is unknown or expired.
    async fn current_user(
        &self,
        access_token: &Secret<String>,
    ) -> Result<Option<AuthIdentity>, anyhow::Error>;
}
