use crate::domain::SubscriptionStatus;
use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("The signature header is malformed.")]
    MalformedHeader,
    #[error("No signature in the header matches the payload.")]
    SignatureMismatch,
    #[error("The signature timestamp is outside the accepted tolerance.")]
    StaleTimestamp,
    #[error("The event payload could not be parsed.")]
    MalformedPayload(#[source] serde_json::Error),
}

/// Checks `Stripe-Signature` style headers: `t=<unix seconds>,v1=<hex>`, where
/// each `v1` is an HMAC-SHA256 over `"{t}.{payload}"`.
pub struct WebhookVerifier {
    secret: Secret<String>,
    tolerance: Duration,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>, tolerance: Duration) -> Self {
        Self { secret, tolerance }
    }

    #[tracing::instrument(name = "Verify billing webhook signature", skip_all)]
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = value.parse::<i64>().ok(),
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader);
        }

        let matches = signatures
            .iter()
            .filter_map(|signature| hex::decode(signature).ok())
            .any(|signature| {
                self.mac(timestamp, payload)
                    .map_or(false, |mac| mac.verify_slice(&signature).is_ok())
            });
        if !matches {
            return Err(WebhookError::SignatureMismatch);
        }

        let age = now.timestamp() - timestamp;
        if age.abs() > self.tolerance.num_seconds() {
            tracing::warn!(timestamp, now = now.timestamp(), "Webhook timestamp out of tolerance");
            return Err(WebhookError::StaleTimestamp);
        }
        Ok(())
    }

    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        header: &str,
        now: DateTime<Utc>,
    ) -> Result<BillingEvent, WebhookError> {
        self.verify(payload, header, now)?;
        BillingEvent::parse(payload)
    }

    fn mac(&self, timestamp: i64, payload: &[u8]) -> Option<Hmac<Sha256>> {
        let mut mac =
            Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        Some(mac)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillingEvent {
    pub id: String,
    pub event_type: String,
    /// When the provider created the event; deliveries may arrive out of
    /// this order.
    pub created: Option<DateTime<Utc>>,
    pub kind: BillingEventKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BillingEventKind {
    CheckoutCompleted(CompletedCheckout),
    SubscriptionUpdated {
        subscription_id: String,
        status: SubscriptionStatus,
    },
    SubscriptionDeleted {
        subscription_id: String,
    },
    PaymentFailed {
        invoice_id: String,
        subscription_id: Option<String>,
    },
    Unhandled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCheckout {
    pub session_id: String,
    pub mode: Option<String>,
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub metadata: HashMap<String, String>,
}

impl BillingEvent {
    pub fn parse(payload: &[u8]) -> Result<BillingEvent, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(payload).map_err(WebhookError::MalformedPayload)?;
        let object = raw.data.object;
        let kind = match raw.event_type.as_str() {
            "checkout.session.completed" => {
                let session: RawCheckoutSession = from_object(object)?;
                BillingEventKind::CheckoutCompleted(CompletedCheckout {
                    session_id: session.id,
                    mode: session.mode,
                    customer_id: session.customer,
                    subscription_id: session.subscription,
                    metadata: session.metadata.unwrap_or_default(),
                })
            }
            "customer.subscription.updated" => {
                let subscription: RawSubscription = from_object(object)?;
                let collection_paused = subscription
                    .pause_collection
                    .map_or(false, |pause| !pause.is_null());
                BillingEventKind::SubscriptionUpdated {
                    status: SubscriptionStatus::from_billing(
                        &subscription.status,
                        collection_paused,
                    ),
                    subscription_id: subscription.id,
                }
            }
            "customer.subscription.deleted" => {
                let subscription: RawSubscription = from_object(object)?;
                BillingEventKind::SubscriptionDeleted {
                    subscription_id: subscription.id,
                }
            }
            "invoice.payment_failed" => {
                let invoice: RawInvoice = from_object(object)?;
                BillingEventKind::PaymentFailed {
                    invoice_id: invoice.id,
                    subscription_id: invoice.subscription,
                }
            }
            _ => BillingEventKind::Unhandled,
        };
        Ok(BillingEvent {
            id: raw.id,
            event_type: raw.event_type,
            created: raw
                .created
                .and_then(|seconds| Utc.timestamp_opt(seconds, 0).single()),
            kind,
        })
    }
}

fn from_object<T: for<'de> Deserialize<'de>>(object: serde_json::Value) -> Result<T, WebhookError> {
    serde_json::from_value(object).map_err(WebhookError::MalformedPayload)
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: Option<i64>,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(Deserialize)]
struct RawCheckoutSession {
    id: String,
    mode: Option<String>,
    customer: Option<String>,
    subscription: Option<String>,
    metadata: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct RawSubscription {
    id: String,
    status: String,
    pause_collection: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct RawInvoice {
    id: String,
    subscription: Option<String>,
}
