use crate::billing::Billing;
use crate::domain::{
    Frequency, PickupDay, PlanType, Subscription, SubscriptionStatus,
};
use crate::guards::AuthenticatedUser;
use crate::routes::{ApiError, Success};
use crate::store::Store;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    pub id: Uuid,
    pub status: SubscriptionStatus,
    pub plan_type: PlanType,
    pub plan_label: &'static str,
    pub frequency: Frequency,
    pub frequency_label: &'static str,
    pub bag_count: u8,
    pub monthly_price: u32,
    pub pickup_day1: PickupDay,
    pub pickup_day2: Option<PickupDay>,
    pub pickup_days_label: String,
    pub pickup_window: String,
    pub created_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
}

impl From<Subscription> for SubscriptionView {
    fn from(subscription: Subscription) -> Self {
        let plan = subscription.plan;
        let schedule = subscription.schedule;
        let pickup_days_label = match schedule.second_day() {
            Some(second) => format!("{} & {}", schedule.first_day().label(), second.label()),
            None => schedule.first_day().label().to_string(),
        };
        SubscriptionView {
            id: subscription.id,
            status: subscription.status,
            plan_type: plan.plan_type,
            plan_label: plan.plan_type.label(),
            frequency: plan.frequency,
            frequency_label: plan.frequency.label(),
            bag_count: plan.bag_count.value(),
            monthly_price: plan.monthly_price(),
            pickup_day1: schedule.first_day(),
            pickup_day2: schedule.second_day(),
            pickup_days_label,
            pickup_window: schedule.window.label(),
            created_at: subscription.created_at,
            paused_at: subscription.paused_at,
        }
    }
}

#[tracing::instrument(name = "Fetching the subscription", skip(user, store), fields(user_id = %user.user_id))]
#[get("/customer/subscription")]
pub async fn get_subscription(
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<SubscriptionView>, ApiError> {
    store
        .live_subscription(user.user_id)
        .await
        .context("Failed to fetch the subscription.")?
        .map(|subscription| Json(subscription.into()))
        .ok_or(ApiError::NotFound("No active subscription"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionAction {
    Pause,
    Resume,
    Cancel,
}

impl SubscriptionAction {
    fn target(&self) -> SubscriptionStatus {
        match self {
            SubscriptionAction::Pause => SubscriptionStatus::Paused,
            SubscriptionAction::Resume => SubscriptionStatus::Active,
            SubscriptionAction::Cancel => SubscriptionStatus::Cancelled,
        }
    }

    fn confirmation(&self) -> &'static str {
        match self {
            SubscriptionAction::Pause => "Your subscription will be paused shortly.",
            SubscriptionAction::Resume => "Your subscription will resume shortly.",
            SubscriptionAction::Cancel => "Your subscription will be cancelled shortly.",
        }
    }
}

impl TryFrom<&str> for SubscriptionAction {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pause" => Ok(Self::Pause),
            "resume" => Ok(Self::Resume),
            "cancel" => Ok(Self::Cancel),
            other => Err(format!("{} is not a subscription action.", other)),
        }
    }
}

/// Asks the billing provider to pause, resume or cancel. The local row only
/// changes once the provider confirms through a webhook event.
#[tracing::instrument(
    name = "Requesting a subscription change",
    skip(user, store, billing),
    fields(user_id = %user.user_id)
)]
#[post("/customer/subscription/<action>")]
pub async fn change_subscription(
    action: &str,
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    billing: &State<Arc<dyn Billing>>,
) -> Result<Custom<Json<Success>>, ApiError> {
    let action = SubscriptionAction::try_from(action)
        .map_err(|_| ApiError::NotFound("Unknown subscription action"))?;
    let subscription = store
        .live_subscription(user.user_id)
        .await
        .context("Failed to fetch the subscription.")?
        .ok_or(ApiError::NotFound("No active subscription"))?;

    let target = action.target();
    if !subscription.status.can_transition_to(target) {
        return Err(ApiError::invalid(format!(
            "A {} subscription cannot be changed to {}.",
            subscription.status.as_str(),
            target.as_str()
        )));
    }
    let billing_subscription_id = subscription
        .billing_subscription_id
        .as_deref()
        .ok_or_else(|| anyhow!("Subscription {} has no billing id.", subscription.id))?;

    match action {
        SubscriptionAction::Pause => billing.pause_subscription(billing_subscription_id).await,
        SubscriptionAction::Resume => billing.resume_subscription(billing_subscription_id).await,
        SubscriptionAction::Cancel => billing.cancel_subscription(billing_subscription_id).await,
    }
    .context("The billing provider rejected the subscription change.")?;

    Ok(Custom(
        Status::Accepted,
        Success::with_message(action.confirmation()),
    ))
}
