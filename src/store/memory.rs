use crate::domain::{
    AccountUpdate, ContactUpdate, CustomerEmail, NewProfile, NewSubscription, Pickup,
    PickupEvidence, PickupStatus, Profile, Role, Subscription, SubscriptionStatus, SupportRequest,
    SupportTicket, TicketStatus, TicketType, ZipCode,
};
use crate::store::{
    is_outdated, mirror_decision, ChangeOutcome, CreateSkipReason, EventOutcome, MirrorDecision,
    OperatorCredentials, OwnedPickup, ProfileCreation, Store, SubscriptionChange, WaitlistJoin,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use secrecy::Secret;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// A `Store` kept in process memory. One lock guards every table, so each
/// call is as atomic as its Postgres counterpart.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, Profile>,
    subscriptions: Vec<Subscription>,
    pickups: Vec<Pickup>,
    waitlist: BTreeSet<(String, String)>,
    support_tickets: Vec<SupportTicket>,
    processed_events: HashMap<String, String>,
    last_event_at: HashMap<Uuid, DateTime<Utc>>,
    operators: HashMap<String, (Uuid, String)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pickups are created by the scheduling process; this seeds one.
    pub fn insert_pickup(&self, pickup: Pickup) {
        self.tables().pickups.push(pickup);
    }

    pub fn pickup(&self, pickup_id: Uuid) -> Option<Pickup> {
        self.tables()
            .pickups
            .iter()
            .find(|p| p.id == pickup_id)
            .cloned()
    }

    pub fn insert_operator(&self, username: &str, password_hash: &str) -> Uuid {
        let operator_id = Uuid::new_v4();
        self.tables().operators.insert(
            username.to_string(),
            (operator_id, password_hash.to_string()),
        );
        operator_id
    }

    pub fn subscriptions_for(&self, user_id: Uuid) -> Vec<Subscription> {
        self.tables()
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn waitlist_entries(&self) -> Vec<(String, String)> {
        self.tables().waitlist.iter().cloned().collect()
    }

    pub fn support_tickets(&self) -> Vec<SupportTicket> {
        self.tables().support_tickets.clone()
    }

    pub fn processed_event_count(&self) -> usize {
        self.tables().processed_events.len()
    }
}

impl Tables {
    fn live_subscription(&self, user_id: Uuid) -> Option<&Subscription> {
        self.subscriptions
            .iter()
            .filter(|s| s.user_id == user_id && s.status.is_live())
            .max_by_key(|s| s.created_at)
    }

    fn create_subscription(&mut self, new: NewSubscription) -> ChangeOutcome {
        if self.live_subscription(new.user_id).is_some() {
            return ChangeOutcome::CreateSkipped(CreateSkipReason::LiveSubscriptionExists);
        }
        let known = self.subscriptions.iter().any(|s| {
            s.billing_subscription_id.as_deref() == Some(new.billing_subscription_id.as_str())
        });
        if known {
            return ChangeOutcome::CreateSkipped(CreateSkipReason::DuplicateBillingSubscription);
        }
        let subscription = Subscription {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            plan: new.plan,
            schedule: new.schedule,
            status: SubscriptionStatus::Active,
            billing_subscription_id: Some(new.billing_subscription_id),
            billing_customer_id: new.billing_customer_id,
            created_at: Utc::now(),
            paused_at: None,
            cancelled_at: None,
        };
        self.subscriptions.push(subscription.clone());
        ChangeOutcome::Created(subscription)
    }

    fn mirror_subscription(
        &mut self,
        billing_subscription_id: &str,
        target: SubscriptionStatus,
        occurred_at: Option<DateTime<Utc>>,
    ) -> ChangeOutcome {
        let subscription = match self
            .subscriptions
            .iter_mut()
            .find(|s| s.billing_subscription_id.as_deref() == Some(billing_subscription_id))
        {
            None => return ChangeOutcome::UnknownSubscription,
            Some(subscription) => subscription,
        };
        let last_event_at = self.last_event_at.get(&subscription.id).copied();
        if is_outdated(last_event_at, occurred_at) {
            return ChangeOutcome::Outdated(subscription.clone());
        }
        if let Some(at) = occurred_at {
            self.last_event_at.insert(subscription.id, at);
        }
        match mirror_decision(subscription.status, target) {
            MirrorDecision::Unchanged => ChangeOutcome::Unchanged(subscription.clone()),
            MirrorDecision::Ignore => ChangeOutcome::Ignored {
                subscription: subscription.clone(),
                to: target,
            },
            MirrorDecision::Transition => {
                let from = subscription.status;
                let now = Utc::now();
                subscription.status = target;
                match target {
                    SubscriptionStatus::Paused => subscription.paused_at = Some(now),
                    SubscriptionStatus::Cancelled => subscription.cancelled_at = Some(now),
                    SubscriptionStatus::Active => {}
                }
                ChangeOutcome::Transitioned {
                    subscription: subscription.clone(),
                    from,
                }
            }
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_profile(&self, profile: NewProfile) -> Result<ProfileCreation, anyhow::Error> {
        let mut tables = self.tables();
        if tables.users.contains_key(&profile.id) {
            return Ok(ProfileCreation::AlreadyExists);
        }
        tables.users.insert(
            profile.id,
            Profile {
                id: profile.id,
                email: profile.email,
                name: Some(profile.name.as_ref().to_string()),
                phone: None,
                address_street: None,
                address_city: None,
                address_state: None,
                address_zip: None,
                role: Role::Customer,
                created_at: Utc::now(),
            },
        );
        Ok(ProfileCreation::Created)
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, anyhow::Error> {
        Ok(self.tables().users.get(&user_id).cloned())
    }

    async fn update_account(
        &self,
        user_id: Uuid,
        update: &AccountUpdate,
    ) -> Result<bool, anyhow::Error> {
        let mut tables = self.tables();
        let profile = match tables.users.get_mut(&user_id) {
            None => return Ok(false),
            Some(profile) => profile,
        };
        profile.name = Some(update.name.as_ref().to_string());
        profile.phone = update.phone.clone();
        profile.address_street = update.address_street.clone();
        profile.address_city = update.address_city.clone();
        profile.address_state = update.address_state.clone();
        profile.address_zip = update.address_zip.as_ref().map(|z| z.as_ref().to_string());
        Ok(true)
    }

    async fn update_contact(
        &self,
        user_id: Uuid,
        update: &ContactUpdate,
    ) -> Result<bool, anyhow::Error> {
        let mut tables = self.tables();
        let profile = match tables.users.get_mut(&user_id) {
            None => return Ok(false),
            Some(profile) => profile,
        };
        profile.phone = Some(update.phone.as_ref().to_string());
        profile.address_street = Some(update.address.street.clone());
        profile.address_city = Some(update.address.city.clone());
        profile.address_state = Some(update.address.state.clone());
        profile.address_zip = Some(update.address.zip.as_ref().to_string());
        Ok(true)
    }

    async fn join_waitlist(
        &self,
        email: &CustomerEmail,
        zip_code: &ZipCode,
    ) -> Result<WaitlistJoin, anyhow::Error> {
        let entry = (email.as_ref().to_lowercase(), zip_code.as_ref().to_string());
        Ok(match self.tables().waitlist.insert(entry) {
            true => WaitlistJoin::Joined,
            false => WaitlistJoin::AlreadyJoined,
        })
    }

    async fn create_support_ticket(
        &self,
        user_id: Uuid,
        request: &SupportRequest,
    ) -> Result<Uuid, anyhow::Error> {
        let id = Uuid::new_v4();
        self.tables().support_tickets.push(SupportTicket {
            id,
            user_id,
            ticket_type: TicketType::Customer,
            subject: request.subject.clone(),
            message: request.message.clone(),
            status: TicketStatus::Open,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn live_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, anyhow::Error> {
        Ok(self.tables().live_subscription(user_id).cloned())
    }

    async fn subscription_by_billing_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Subscription>, anyhow::Error> {
        Ok(self
            .tables()
            .subscriptions
            .iter()
            .find(|s| s.billing_subscription_id.as_deref() == Some(billing_subscription_id))
            .cloned())
    }

    async fn list_pickups(&self, user_id: Uuid) -> Result<Vec<Pickup>, anyhow::Error> {
        let tables = self.tables();
        let owned: Vec<Uuid> = tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.id)
            .collect();
        let mut pickups: Vec<Pickup> = tables
            .pickups
            .iter()
            .filter(|p| owned.contains(&p.subscription_id))
            .cloned()
            .collect();
        pickups.sort_by_key(|p| p.scheduled_date);
        Ok(pickups)
    }

    async fn find_pickup(&self, pickup_id: Uuid) -> Result<Option<OwnedPickup>, anyhow::Error> {
        let tables = self.tables();
        let pickup = match tables.pickups.iter().find(|p| p.id == pickup_id) {
            None => return Ok(None),
            Some(pickup) => pickup,
        };
        Ok(tables
            .subscriptions
            .iter()
            .find(|s| s.id == pickup.subscription_id)
            .map(|s| OwnedPickup {
                pickup: pickup.clone(),
                owner_id: s.user_id,
            }))
    }

    async fn skip_pickup(
        &self,
        pickup_id: Uuid,
        earliest: NaiveDate,
    ) -> Result<bool, anyhow::Error> {
        let mut tables = self.tables();
        match tables.pickups.iter_mut().find(|p| {
            p.id == pickup_id
                && p.status == PickupStatus::Scheduled
                && p.scheduled_date >= earliest
        }) {
            None => Ok(false),
            Some(pickup) => {
                pickup.status = PickupStatus::Skipped;
                Ok(true)
            }
        }
    }

    async fn advance_pickup(
        &self,
        pickup_id: Uuid,
        from: PickupStatus,
        to: PickupStatus,
        evidence: &PickupEvidence,
    ) -> Result<bool, anyhow::Error> {
        let mut tables = self.tables();
        let pickup = match tables
            .pickups
            .iter_mut()
            .find(|p| p.id == pickup_id && p.status == from)
        {
            None => return Ok(false),
            Some(pickup) => pickup,
        };
        pickup.status = to;
        match to {
            PickupStatus::PickedUp => {
                pickup.picked_up_at = Some(evidence.at);
                pickup.pickup_photo_url = evidence.photo_url.clone();
            }
            PickupStatus::Delivered => {
                pickup.delivered_at = Some(evidence.at);
                pickup.delivery_photo_url = evidence.photo_url.clone();
            }
            _ => {}
        }
        Ok(true)
    }

    async fn operator_credentials(
        &self,
        username: &str,
    ) -> Result<Option<OperatorCredentials>, anyhow::Error> {
        Ok(self
            .tables()
            .operators
            .get(username)
            .map(|(operator_id, hash)| OperatorCredentials {
                operator_id: *operator_id,
                password_hash: Secret::new(hash.clone()),
            }))
    }

    async fn apply_billing_event(
        &self,
        event_id: &str,
        event_type: &str,
        change: SubscriptionChange,
    ) -> Result<EventOutcome, anyhow::Error> {
        let mut tables = self.tables();
        if tables.processed_events.contains_key(event_id) {
            return Ok(EventOutcome::Duplicate);
        }
        tables
            .processed_events
            .insert(event_id.to_string(), event_type.to_string());
        let outcome = match change {
            SubscriptionChange::Nothing => ChangeOutcome::NoChange,
            SubscriptionChange::Create(new) => tables.create_subscription(new),
            SubscriptionChange::Mirror {
                billing_subscription_id,
                status,
                occurred_at,
            } => tables.mirror_subscription(&billing_subscription_id, status, occurred_at),
        };
        Ok(EventOutcome::Applied(outcome))
    }
}
