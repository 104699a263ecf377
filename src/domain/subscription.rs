use crate::domain::{PickupSchedule, Plan};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }

    /// `active <-> paused`, and either into the terminal `cancelled`.
    pub fn can_transition_to(&self, next: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;
        matches!(
            (self, next),
            (Active, Paused) | (Paused, Active) | (Active, Cancelled) | (Paused, Cancelled)
        )
    }

    /// A live subscription still holds the customer's single active slot.
    pub fn is_live(&self) -> bool {
        !matches!(self, SubscriptionStatus::Cancelled)
    }

    /// Statuses from which `self` can be entered.
    pub fn predecessors(&self) -> Vec<SubscriptionStatus> {
        [
            SubscriptionStatus::Active,
            SubscriptionStatus::Paused,
            SubscriptionStatus::Cancelled,
        ]
        .into_iter()
        .filter(|from| from.can_transition_to(*self))
        .collect()
    }

    /// Maps the billing provider's subscription status onto ours. A provider
    /// subscription with collection paused is still `active` on their side.
    pub fn from_billing(status: &str, collection_paused: bool) -> SubscriptionStatus {
        match status {
            "canceled" => SubscriptionStatus::Cancelled,
            "active" | "trialing" if !collection_paused => SubscriptionStatus::Active,
            _ => SubscriptionStatus::Paused,
        }
    }
}

impl TryFrom<&str> for SubscriptionStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(format!("{} is not a subscription status.", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: Plan,
    pub schedule: PickupSchedule,
    pub status: SubscriptionStatus,
    pub billing_subscription_id: Option<String>,
    pub billing_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

/// A subscription confirmed by a completed checkout, not yet stored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan: Plan,
    pub schedule: PickupSchedule,
    pub billing_subscription_id: String,
    pub billing_customer_id: Option<String>,
}
