use crate::billing::{
    BillingEvent, BillingEventKind, CheckoutMetadata, CompletedCheckout, WebhookError,
    WebhookVerifier,
};
use crate::domain::{format_long_date, CustomerEmail, ServiceCalendar, Subscription, SubscriptionStatus};
use crate::email::{self, Email, Notification};
use crate::guards::BillingSignature;
use crate::routes::ApiError;
use crate::store::{ChangeOutcome, EventOutcome, Store, SubscriptionChange};
use anyhow::{anyhow, Context};
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct Received {
    pub received: bool,
}

/// Receives billing provider events. The signature is checked before
/// anything else; each event id is applied at most once.
#[tracing::instrument(
    name = "Handling a billing webhook",
    skip(signature, payload, verifier, store, email_client, calendar),
    fields(event_id = tracing::field::Empty, event_type = tracing::field::Empty)
)]
#[post("/webhooks/billing", data = "<payload>")]
pub async fn billing_webhook(
    signature: Option<BillingSignature>,
    payload: Vec<u8>,
    verifier: &State<WebhookVerifier>,
    store: &State<Arc<dyn Store>>,
    email_client: &State<Arc<dyn Email>>,
    calendar: &State<ServiceCalendar>,
) -> Result<Json<Received>, ApiError> {
    let signature = signature.ok_or(ApiError::InvalidSignature(WebhookError::MalformedHeader))?;
    let event = verifier
        .verify_and_parse(&payload, &signature.0, Utc::now())
        .map_err(ApiError::InvalidSignature)?;
    let span = tracing::Span::current();
    span.record("event_id", &tracing::field::display(&event.id));
    span.record("event_type", &tracing::field::display(&event.event_type));

    let change = subscription_change(&event);
    let outcome = store
        .apply_billing_event(&event.id, &event.event_type, change)
        .await
        .context("Failed to apply a billing event.")?;

    let notifier = Notifier {
        store: store.inner().as_ref(),
        email_client: email_client.inner().as_ref(),
    };
    match outcome {
        EventOutcome::Duplicate => tracing::info!("Billing event already processed"),
        EventOutcome::Applied(outcome) => {
            after_change(&event, outcome, &notifier, calendar.inner()).await
        }
    }
    Ok(Json(Received { received: true }))
}

fn subscription_change(event: &BillingEvent) -> SubscriptionChange {
    match &event.kind {
        BillingEventKind::CheckoutCompleted(checkout) => match new_subscription(checkout) {
            Ok(change) => change,
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Cannot create a subscription from a completed checkout");
                SubscriptionChange::Nothing
            }
        },
        BillingEventKind::SubscriptionUpdated {
            subscription_id,
            status,
        } => SubscriptionChange::Mirror {
            billing_subscription_id: subscription_id.clone(),
            status: *status,
            occurred_at: event.created,
        },
        BillingEventKind::SubscriptionDeleted { subscription_id } => SubscriptionChange::Mirror {
            billing_subscription_id: subscription_id.clone(),
            status: SubscriptionStatus::Cancelled,
            occurred_at: event.created,
        },
        BillingEventKind::PaymentFailed { .. } | BillingEventKind::Unhandled => {
            SubscriptionChange::Nothing
        }
    }
}

fn new_subscription(checkout: &CompletedCheckout) -> Result<SubscriptionChange, anyhow::Error> {
    if checkout.mode.as_deref() != Some("subscription") {
        return Ok(SubscriptionChange::Nothing);
    }
    let subscription_id = checkout
        .subscription_id
        .clone()
        .ok_or_else(|| anyhow!("Checkout session {} has no subscription.", checkout.session_id))?;
    let metadata = CheckoutMetadata::from_map(&checkout.metadata)
        .with_context(|| format!("Checkout session {} has unusable metadata.", checkout.session_id))?;
    Ok(SubscriptionChange::Create(metadata.into_new_subscription(
        subscription_id,
        checkout.customer_id.clone(),
    )))
}

async fn after_change(
    event: &BillingEvent,
    outcome: ChangeOutcome,
    notifier: &Notifier<'_>,
    calendar: &ServiceCalendar,
) {
    match outcome {
        ChangeOutcome::Created(subscription) => {
            tracing::info!(subscription_id = %subscription.id, "Subscription created");
            let first_day = subscription.schedule.first_day();
            let first_pickup = format_long_date(calendar.next_occurrence(first_day, Utc::now()));
            notifier
                .notify(subscription.user_id, |name| {
                    email::subscription_welcome(name, first_day.label(), &first_pickup)
                })
                .await;
        }
        ChangeOutcome::CreateSkipped(reason) => {
            tracing::info!(?reason, "Completed checkout did not create a subscription")
        }
        ChangeOutcome::Transitioned { subscription, from } => {
            tracing::info!(
                subscription_id = %subscription.id,
                from = from.as_str(),
                to = subscription.status.as_str(),
                "Subscription status mirrored"
            );
            notify_transition(&subscription, notifier).await;
        }
        ChangeOutcome::Unchanged(_) => {}
        ChangeOutcome::Ignored { subscription, to } => tracing::warn!(
            subscription_id = %subscription.id,
            current = subscription.status.as_str(),
            requested = to.as_str(),
            "Ignoring a status change the lifecycle does not allow"
        ),
        ChangeOutcome::Outdated(subscription) => tracing::info!(
            subscription_id = %subscription.id,
            "Ignoring a subscription event older than the last one applied"
        ),
        ChangeOutcome::UnknownSubscription => {
            tracing::warn!("Billing event refers to an unknown subscription")
        }
        ChangeOutcome::NoChange => {
            if let BillingEventKind::PaymentFailed {
                invoice_id,
                subscription_id: Some(subscription_id),
            } = &event.kind
            {
                tracing::warn!(%invoice_id, %subscription_id, "Payment failed");
                notify_payment_failed(subscription_id, notifier).await;
            }
        }
    }
}

async fn notify_transition(subscription: &Subscription, notifier: &Notifier<'_>) {
    let template: fn(&str) -> Notification = match subscription.status {
        SubscriptionStatus::Paused => email::subscription_paused,
        SubscriptionStatus::Cancelled => email::subscription_cancelled,
        SubscriptionStatus::Active => return,
    };
    notifier.notify(subscription.user_id, template).await;
}

async fn notify_payment_failed(billing_subscription_id: &str, notifier: &Notifier<'_>) {
    match notifier
        .store
        .subscription_by_billing_id(billing_subscription_id)
        .await
    {
        Ok(Some(subscription)) => {
            notifier
                .notify(subscription.user_id, email::payment_failed)
                .await
        }
        Ok(None) => tracing::warn!("Failed payment for an unknown subscription"),
        Err(error) => {
            tracing::error!(error.cause_chain = ?error, "Failed to look up a subscription")
        }
    }
}

struct Notifier<'a> {
    store: &'a dyn Store,
    email_client: &'a dyn Email,
}

impl Notifier<'_> {
    /// The event is already recorded at this point, so a missing or
    /// unreadable profile only costs the email.
    async fn notify(&self, user_id: Uuid, template: impl FnOnce(&str) -> Notification) {
        let profile = match self.store.get_profile(user_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(%user_id, "No profile to notify");
                return;
            }
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, %user_id, "Failed to fetch a profile");
                return;
            }
        };
        let recipient = match CustomerEmail::parse(profile.email) {
            Ok(recipient) => recipient,
            Err(error) => {
                tracing::warn!(%error, %user_id, "Skipping a notification to an invalid address");
                return;
            }
        };
        let name = profile.name.as_deref().unwrap_or("there");
        email::notify(self.email_client, &recipient, template(name)).await;
    }
}
