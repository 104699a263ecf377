use crate::billing::{
    Billing, CheckoutCustomer, CheckoutMetadata, CheckoutSession, CheckoutSessionStatus,
};
use crate::domain::CheckoutRequest;
use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::collections::HashMap;

/// Stripe's REST API: form-encoded requests, the secret key as the basic
/// auth user.
pub struct StripeClient {
    http_client: Client,
    api_base_url: String,
    secret_key: Secret<String>,
    app_base_url: String,
}

impl StripeClient {
    pub fn new(
        api_base_url: String,
        secret_key: Secret<String>,
        app_base_url: String,
        timeout: std::time::Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the billing HTTP client.")?;
        Ok(Self {
            http_client,
            api_base_url,
            secret_key,
            app_base_url,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.api_base_url, path))
            .basic_auth(self.secret_key.expose_secret(), Option::<&str>::None)
    }

    async fn send<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, anyhow::Error> {
        request
            .send()
            .await
            .context("Failed to reach the billing provider.")?
            .error_for_status()
            .context("The billing provider rejected the request.")?
            .json::<T>()
            .await
            .context("Failed to parse the billing provider's response.")
    }

    fn checkout_form(
        &self,
        customer: &CheckoutCustomer,
        request: &CheckoutRequest,
    ) -> Vec<(String, String)> {
        let metadata = CheckoutMetadata {
            user_id: customer.user_id,
            plan: request.plan,
            schedule: request.schedule,
        };
        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "subscription".into()),
            ("customer_email".into(), customer.email.clone()),
            ("client_reference_id".into(), customer.user_id.to_string()),
            ("line_items[0][price]".into(), request.plan.price_id().into()),
            ("line_items[0][quantity]".into(), "1".into()),
            (
                "success_url".into(),
                format!(
                    "{}/onboarding/success?session_id={{CHECKOUT_SESSION_ID}}",
                    self.app_base_url
                ),
            ),
            (
                "cancel_url".into(),
                format!("{}/onboarding", self.app_base_url),
            ),
        ];
        for (key, value) in metadata.to_pairs() {
            form.push((format!("metadata[{}]", key), value.clone()));
            form.push((format!("subscription_data[metadata][{}]", key), value));
        }
        form
    }
}

#[derive(Deserialize)]
struct StripeCheckoutSession {
    id: String,
    url: Option<String>,
    payment_status: Option<String>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

#[async_trait]
impl Billing for StripeClient {
    #[tracing::instrument(name = "Create a checkout session", skip_all, fields(user_id = %customer.user_id))]
    async fn create_checkout_session(
        &self,
        customer: &CheckoutCustomer,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, anyhow::Error> {
        let form = self.checkout_form(customer, request);
        let session: StripeCheckoutSession = self
            .send(self.request(Method::POST, "/checkout/sessions").form(&form))
            .await?;
        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    #[tracing::instrument(name = "Retrieve a checkout session", skip(self))]
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionStatus>, anyhow::Error> {
        let response = self
            .request(Method::GET, &format!("/checkout/sessions/{}", session_id))
            .send()
            .await
            .context("Failed to reach the billing provider.")?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let session: StripeCheckoutSession = response
            .error_for_status()
            .context("The billing provider rejected the request.")?
            .json()
            .await
            .context("Failed to parse the billing provider's response.")?;
        Ok(Some(CheckoutSessionStatus {
            id: session.id,
            payment_status: session.payment_status.unwrap_or_default(),
            metadata: session.metadata.unwrap_or_default(),
        }))
    }

    #[tracing::instrument(name = "Pause a billing subscription", skip(self))]
    async fn pause_subscription(&self, billing_subscription_id: &str) -> Result<(), anyhow::Error> {
        let _: serde_json::Value = self
            .send(
                self.request(
                    Method::POST,
                    &format!("/subscriptions/{}", billing_subscription_id),
                )
                .form(&[("pause_collection[behavior]", "void")]),
            )
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Resume a billing subscription", skip(self))]
    async fn resume_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<(), anyhow::Error> {
        // An empty value unsets the field.
        let _: serde_json::Value = self
            .send(
                self.request(
                    Method::POST,
                    &format!("/subscriptions/{}", billing_subscription_id),
                )
                .form(&[("pause_collection", "")]),
            )
            .await?;
        Ok(())
    }

    #[tracing::instrument(name = "Cancel a billing subscription", skip(self))]
    async fn cancel_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<(), anyhow::Error> {
        let _: serde_json::Value = self
            .send(self.request(
                Method::DELETE,
                &format!("/subscriptions/{}", billing_subscription_id),
            ))
            .await?;
        Ok(())
    }
}
