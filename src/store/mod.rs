mod memory;
mod postgres;

use crate::domain::{
    AccountUpdate, ContactUpdate, CustomerEmail, NewProfile, NewSubscription, Pickup,
    PickupEvidence, PickupStatus, Profile, Subscription, SubscriptionStatus, SupportRequest,
    ZipCode,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
use secrecy::Secret;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileCreation {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitlistJoin {
    Joined,
    AlreadyJoined,
}

/// A pickup together with the user whose subscription it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedPickup {
    pub pickup: Pickup,
    pub owner_id: Uuid,
}

pub struct OperatorCredentials {
    pub operator_id: Uuid,
    pub password_hash: Secret<String>,
}

/// What a confirmed billing event asks of the subscriptions table.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionChange {
    Create(NewSubscription),
    Mirror {
        billing_subscription_id: String,
        status: SubscriptionStatus,
        /// Creation time of the event carrying the status, if known.
        occurred_at: Option<DateTime<Utc>>,
    },
    Nothing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    /// The event id is already in the ledger; nothing was touched.
    Duplicate,
    Applied(ChangeOutcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateSkipReason {
    LiveSubscriptionExists,
    DuplicateBillingSubscription,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeOutcome {
    Created(Subscription),
    CreateSkipped(CreateSkipReason),
    Transitioned {
        subscription: Subscription,
        from: SubscriptionStatus,
    },
    Unchanged(Subscription),
    /// The lifecycle forbids the move; the row was left alone.
    Ignored {
        subscription: Subscription,
        to: SubscriptionStatus,
    },
    /// A newer event for this subscription was already applied.
    Outdated(Subscription),
    UnknownSubscription,
    NoChange,
}

pub(crate) enum MirrorDecision {
    Unchanged,
    Transition,
    Ignore,
}

/// True when `occurred_at` predates the newest event already mirrored.
pub(crate) fn is_outdated(
    last_event_at: Option<DateTime<Utc>>,
    occurred_at: Option<DateTime<Utc>>,
) -> bool {
    matches!((last_event_at, occurred_at), (Some(last), Some(at)) if at < last)
}

pub(crate) fn mirror_decision(
    current: SubscriptionStatus,
    target: SubscriptionStatus,
) -> MirrorDecision {
    if current == target {
        MirrorDecision::Unchanged
    } else if current.can_transition_to(target) {
        MirrorDecision::Transition
    } else {
        MirrorDecision::Ignore
    }
}

/// Persistence for everything the service owns. Every method is atomic on
/// its own; conditional writes report whether they matched.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_profile(&self, profile: NewProfile) -> Result<ProfileCreation, anyhow::Error>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, anyhow::Error>;

    /// `false` when there is no profile to update.
    async fn update_account(
        &self,
        user_id: Uuid,
        update: &AccountUpdate,
    ) -> Result<bool, anyhow::Error>;

    async fn update_contact(
        &self,
        user_id: Uuid,
        update: &ContactUpdate,
    ) -> Result<bool, anyhow::Error>;

    async fn join_waitlist(
        &self,
        email: &CustomerEmail,
        zip_code: &ZipCode,
    ) -> Result<WaitlistJoin, anyhow::Error>;

    async fn create_support_ticket(
        &self,
        user_id: Uuid,
        request: &SupportRequest,
    ) -> Result<Uuid, anyhow::Error>;

    /// The user's active or paused subscription, if any.
    async fn live_subscription(&self, user_id: Uuid)
        -> Result<Option<Subscription>, anyhow::Error>;

    async fn subscription_by_billing_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Subscription>, anyhow::Error>;

    /// All pickups across the user's subscriptions, oldest first.
    async fn list_pickups(&self, user_id: Uuid) -> Result<Vec<Pickup>, anyhow::Error>;

    async fn find_pickup(&self, pickup_id: Uuid) -> Result<Option<OwnedPickup>, anyhow::Error>;

    /// Marks the pickup skipped only if it is still scheduled and falls on or
    /// after `earliest`.
    async fn skip_pickup(
        &self,
        pickup_id: Uuid,
        earliest: NaiveDate,
    ) -> Result<bool, anyhow::Error>;

    /// Moves the pickup from `from` to `to` only if it is still in `from`.
    async fn advance_pickup(
        &self,
        pickup_id: Uuid,
        from: PickupStatus,
        to: PickupStatus,
        evidence: &PickupEvidence,
    ) -> Result<bool, anyhow::Error>;

    async fn operator_credentials(
        &self,
        username: &str,
    ) -> Result<Option<OperatorCredentials>, anyhow::Error>;

    /// Records `event_id` in the ledger and applies `change` in the same
    /// transaction. A known event id is a no-op.
    async fn apply_billing_event(
        &self,
        event_id: &str,
        event_type: &str,
        change: SubscriptionChange,
    ) -> Result<EventOutcome, anyhow::Error>;
}
