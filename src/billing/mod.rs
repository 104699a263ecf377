mod metadata;
mod stripe_client;
mod webhook;

use crate::domain::CheckoutRequest;
use async_trait::async_trait;
pub use metadata::CheckoutMetadata;
use std::collections::HashMap;
pub use stripe_client::StripeClient;
use uuid::Uuid;
pub use webhook::*;

/// The customer a checkout session is opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutCustomer {
    pub user_id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page, when the provider returns one.
    pub url: Option<String>,
}

/// What the provider reports about a checkout session after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionStatus {
    pub id: String,
    pub payment_status: String,
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionStatus {
    pub fn is_paid(&self) -> bool {
        self.payment_status == "paid"
    }

    /// The user the session was opened for, if the metadata names one.
    pub fn user_id(&self) -> Option<Uuid> {
        self.metadata
            .get(metadata::USER_ID)
            .and_then(|id| Uuid::parse_str(id).ok())
    }
}

/// The subscription billing provider. Local subscription state only changes
/// when the provider later confirms through a webhook event.
#[async_trait]
pub trait Billing: Send + Sync {
    async fn create_checkout_session(
        &self,
        customer: &CheckoutCustomer,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, anyhow::Error>;

    /// `None` when the provider does not know the session.
    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionStatus>, anyhow::Error>;

    async fn pause_subscription(&self, billing_subscription_id: &str)
        -> Result<(), anyhow::Error>;

    async fn resume_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<(), anyhow::Error>;

    async fn cancel_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<(), anyhow::Error>;
}
