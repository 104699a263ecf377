use crate::domain::PickupWindow;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupStatus {
    Scheduled,
    Skipped,
    PickedUp,
    Washing,
    Ready,
    OutForDelivery,
    Delivered,
    NoBags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("A pickup cannot move from {} to {}.", .from.as_str(), .to.as_str())]
pub struct IllegalTransition {
    pub from: PickupStatus,
    pub to: PickupStatus,
}

impl PickupStatus {
    pub const ALL: [PickupStatus; 8] = [
        PickupStatus::Scheduled,
        PickupStatus::Skipped,
        PickupStatus::PickedUp,
        PickupStatus::Washing,
        PickupStatus::Ready,
        PickupStatus::OutForDelivery,
        PickupStatus::Delivered,
        PickupStatus::NoBags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PickupStatus::Scheduled => "scheduled",
            PickupStatus::Skipped => "skipped",
            PickupStatus::PickedUp => "picked_up",
            PickupStatus::Washing => "washing",
            PickupStatus::Ready => "ready",
            PickupStatus::OutForDelivery => "out_for_delivery",
            PickupStatus::Delivered => "delivered",
            PickupStatus::NoBags => "no_bags",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PickupStatus::Scheduled => "Scheduled",
            PickupStatus::Skipped => "Skipped",
            PickupStatus::PickedUp => "Picked Up",
            PickupStatus::Washing => "Being Cleaned",
            PickupStatus::Ready => "Ready for Delivery",
            PickupStatus::OutForDelivery => "Out for Delivery",
            PickupStatus::Delivered => "Delivered",
            PickupStatus::NoBags => "No Bags",
        }
    }

    /// Statuses reachable in one step. The lifecycle only moves forward.
    pub fn successors(&self) -> &'static [PickupStatus] {
        use PickupStatus::*;
        match self {
            Scheduled => &[PickedUp, Skipped, NoBags],
            PickedUp => &[Washing],
            Washing => &[Ready],
            Ready => &[OutForDelivery],
            OutForDelivery => &[Delivered],
            Skipped | Delivered | NoBags => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.successors().is_empty()
    }

    pub fn can_transition_to(&self, next: PickupStatus) -> bool {
        self.successors().contains(&next)
    }

    pub fn transition_to(self, next: PickupStatus) -> Result<PickupStatus, IllegalTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(IllegalTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl TryFrom<&str> for PickupStatus {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        PickupStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("{} is not a pickup status.", s))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pickup {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub window: PickupWindow,
    pub status: PickupStatus,
    pub pickup_photo_url: Option<String>,
    pub delivery_photo_url: Option<String>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

/// Side data recorded with a provider-side status change.
#[derive(Debug, Clone, PartialEq)]
pub struct PickupEvidence {
    pub photo_url: Option<String>,
    pub at: DateTime<Utc>,
}
