use crate::configuration::DatabaseSettings;
use crate::domain::{
    AccountUpdate, ContactUpdate, CustomerEmail, NewProfile, Pickup, PickupEvidence,
    PickupStatus, Profile, Role, Subscription, SubscriptionStatus, SupportRequest, TicketStatus,
    TicketType, ZipCode,
};
use crate::models::*;
use crate::store::{
    is_outdated, mirror_decision, ChangeOutcome, CreateSkipReason, EventOutcome, MirrorDecision,
    OperatorCredentials, OwnedPickup, ProfileCreation, Store, SubscriptionChange, WaitlistJoin,
};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::{
    Connection, ExpressionMethods, OptionalExtension, PgConnection, QueryDsl, RunQueryDsl,
};
use secrecy::{ExposeSecret, Secret};
use uuid::Uuid;

type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connections are opened lazily, so this succeeds even while the
    /// database is unreachable.
    pub fn connect_lazy(settings: &DatabaseSettings) -> Self {
        let manager =
            ConnectionManager::<PgConnection>::new(settings.connection_string().expose_secret());
        let pool = Pool::builder()
            .connection_timeout(std::time::Duration::from_secs(2))
            .build_unchecked(manager);
        Self::new(pool)
    }

    #[tracing::instrument(name = "Run database migrations", skip(self))]
    pub async fn run_migrations(&self) -> Result<(), anyhow::Error> {
        self.run(|conn| {
            diesel_migrations::run_pending_migrations(conn)
                .context("Failed to run database migrations.")
        })
        .await
    }

    /// Runs blocking diesel work on the blocking thread pool.
    async fn run<T, F>(&self, f: F) -> Result<T, anyhow::Error>
    where
        F: FnOnce(&PgConnection) -> Result<T, anyhow::Error> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .context("Failed to retrieve a connection from the DB pool.")?;
            f(&conn)
        })
        .await
        .context("A database task failed to complete.")?
    }
}

#[async_trait]
impl Store for PgStore {
    #[tracing::instrument(name = "Saving a new profile", skip(self, profile), fields(user_id = %profile.id))]
    async fn create_profile(&self, profile: NewProfile) -> Result<ProfileCreation, anyhow::Error> {
        use crate::schema::users;
        self.run(move |conn| {
            let now = Utc::now();
            let inserted = diesel::insert_into(users::table)
                .values(NewUser {
                    id: &profile.id,
                    email: &profile.email,
                    name: profile.name.as_ref(),
                    role: Role::Customer.as_str(),
                    created_at: &now,
                    updated_at: &now,
                })
                .on_conflict_do_nothing()
                .execute(conn)
                .context("Failed to insert a profile.")?;
            Ok(match inserted {
                0 => ProfileCreation::AlreadyExists,
                _ => ProfileCreation::Created,
            })
        })
        .await
    }

    #[tracing::instrument(name = "Fetching a profile", skip(self))]
    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, anyhow::Error> {
        use crate::schema::users;
        self.run(move |conn| {
            users::table
                .find(user_id)
                .first::<UserRow>(conn)
                .optional()
                .context("Failed to fetch a profile.")?
                .map(Profile::try_from)
                .transpose()
        })
        .await
    }

    #[tracing::instrument(name = "Updating account settings", skip(self, update))]
    async fn update_account(
        &self,
        user_id: Uuid,
        update: &AccountUpdate,
    ) -> Result<bool, anyhow::Error> {
        use crate::schema::users;
        let update = update.clone();
        self.run(move |conn| {
            let updated = diesel::update(users::table.find(user_id))
                .set((
                    users::name.eq(update.name.as_ref()),
                    users::phone.eq(update.phone),
                    users::address_street.eq(update.address_street),
                    users::address_city.eq(update.address_city),
                    users::address_state.eq(update.address_state),
                    users::address_zip.eq(update.address_zip.map(|z| z.as_ref().to_string())),
                    users::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .context("Failed to update account settings.")?;
            Ok(updated > 0)
        })
        .await
    }

    #[tracing::instrument(name = "Saving checkout contact details", skip(self, update))]
    async fn update_contact(
        &self,
        user_id: Uuid,
        update: &ContactUpdate,
    ) -> Result<bool, anyhow::Error> {
        use crate::schema::users;
        let update = update.clone();
        self.run(move |conn| {
            let updated = diesel::update(users::table.find(user_id))
                .set((
                    users::phone.eq(update.phone.as_ref()),
                    users::address_street.eq(update.address.street.as_str()),
                    users::address_city.eq(update.address.city.as_str()),
                    users::address_state.eq(update.address.state.as_str()),
                    users::address_zip.eq(update.address.zip.as_ref()),
                    users::updated_at.eq(Utc::now()),
                ))
                .execute(conn)
                .context("Failed to save contact details.")?;
            Ok(updated > 0)
        })
        .await
    }

    #[tracing::instrument(name = "Joining the waitlist", skip(self, email))]
    async fn join_waitlist(
        &self,
        email: &CustomerEmail,
        zip_code: &ZipCode,
    ) -> Result<WaitlistJoin, anyhow::Error> {
        use crate::schema::waitlist;
        let email = email.as_ref().to_lowercase();
        let zip_code = zip_code.as_ref().to_string();
        self.run(move |conn| {
            let inserted = diesel::insert_into(waitlist::table)
                .values(NewWaitlistEntry {
                    id: &Uuid::new_v4(),
                    email: &email,
                    zip_code: &zip_code,
                    created_at: &Utc::now(),
                })
                .on_conflict_do_nothing()
                .execute(conn)
                .context("Failed to insert a waitlist entry.")?;
            Ok(match inserted {
                0 => WaitlistJoin::AlreadyJoined,
                _ => WaitlistJoin::Joined,
            })
        })
        .await
    }

    #[tracing::instrument(name = "Opening a support ticket", skip(self, request))]
    async fn create_support_ticket(
        &self,
        user_id: Uuid,
        request: &SupportRequest,
    ) -> Result<Uuid, anyhow::Error> {
        use crate::schema::support_tickets;
        let request = request.clone();
        self.run(move |conn| {
            let id = Uuid::new_v4();
            let now = Utc::now();
            diesel::insert_into(support_tickets::table)
                .values(NewSupportTicket {
                    id: &id,
                    user_id: &user_id,
                    ticket_type: TicketType::Customer.as_str(),
                    subject: &request.subject,
                    message: &request.message,
                    status: TicketStatus::Open.as_str(),
                    created_at: &now,
                    updated_at: &now,
                })
                .execute(conn)
                .context("Failed to insert a support ticket.")?;
            Ok(id)
        })
        .await
    }

    #[tracing::instrument(name = "Fetching the live subscription", skip(self))]
    async fn live_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<Subscription>, anyhow::Error> {
        use crate::schema::subscriptions;
        self.run(move |conn| {
            subscriptions::table
                .filter(subscriptions::user_id.eq(user_id))
                .filter(subscriptions::status.ne(SubscriptionStatus::Cancelled.as_str()))
                .order(subscriptions::created_at.desc())
                .first::<SubscriptionRow>(conn)
                .optional()
                .context("Failed to fetch the live subscription.")?
                .map(Subscription::try_from)
                .transpose()
        })
        .await
    }

    #[tracing::instrument(name = "Fetching a subscription by billing id", skip(self))]
    async fn subscription_by_billing_id(
        &self,
        billing_subscription_id: &str,
    ) -> Result<Option<Subscription>, anyhow::Error> {
        use crate::schema::subscriptions;
        let billing_subscription_id = billing_subscription_id.to_string();
        self.run(move |conn| {
            subscriptions::table
                .filter(subscriptions::billing_subscription_id.eq(billing_subscription_id))
                .first::<SubscriptionRow>(conn)
                .optional()
                .context("Failed to fetch a subscription.")?
                .map(Subscription::try_from)
                .transpose()
        })
        .await
    }

    #[tracing::instrument(name = "Listing pickups", skip(self))]
    async fn list_pickups(&self, user_id: Uuid) -> Result<Vec<Pickup>, anyhow::Error> {
        use crate::schema::{pickups, subscriptions};
        self.run(move |conn| {
            pickups::table
                .inner_join(subscriptions::table)
                .filter(subscriptions::user_id.eq(user_id))
                .select(pickups::all_columns)
                .order(pickups::scheduled_date.asc())
                .load::<PickupRow>(conn)
                .context("Failed to list pickups.")?
                .into_iter()
                .map(Pickup::try_from)
                .collect()
        })
        .await
    }

    #[tracing::instrument(name = "Fetching a pickup", skip(self))]
    async fn find_pickup(&self, pickup_id: Uuid) -> Result<Option<OwnedPickup>, anyhow::Error> {
        use crate::schema::{pickups, subscriptions};
        self.run(move |conn| {
            let row = pickups::table
                .inner_join(subscriptions::table)
                .filter(pickups::id.eq(pickup_id))
                .select((pickups::all_columns, subscriptions::user_id))
                .first::<(PickupRow, Uuid)>(conn)
                .optional()
                .context("Failed to fetch a pickup.")?;
            match row {
                None => Ok(None),
                Some((row, owner_id)) => Ok(Some(OwnedPickup {
                    pickup: Pickup::try_from(row)?,
                    owner_id,
                })),
            }
        })
        .await
    }

    #[tracing::instrument(name = "Skipping a pickup", skip(self))]
    async fn skip_pickup(
        &self,
        pickup_id: Uuid,
        earliest: NaiveDate,
    ) -> Result<bool, anyhow::Error> {
        use crate::schema::pickups;
        self.run(move |conn| {
            let updated = diesel::update(
                pickups::table
                    .filter(pickups::id.eq(pickup_id))
                    .filter(pickups::status.eq(PickupStatus::Scheduled.as_str()))
                    .filter(pickups::scheduled_date.ge(earliest)),
            )
            .set((
                pickups::status.eq(PickupStatus::Skipped.as_str()),
                pickups::updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .context("Failed to skip a pickup.")?;
            Ok(updated == 1)
        })
        .await
    }

    #[tracing::instrument(name = "Advancing a pickup", skip(self, evidence))]
    async fn advance_pickup(
        &self,
        pickup_id: Uuid,
        from: PickupStatus,
        to: PickupStatus,
        evidence: &PickupEvidence,
    ) -> Result<bool, anyhow::Error> {
        use crate::schema::pickups;
        let evidence = evidence.clone();
        self.run(move |conn| {
            let target = pickups::table
                .filter(pickups::id.eq(pickup_id))
                .filter(pickups::status.eq(from.as_str()));
            let status = pickups::status.eq(to.as_str());
            let updated_at = pickups::updated_at.eq(evidence.at);
            let updated = match to {
                PickupStatus::PickedUp => diesel::update(target)
                    .set((
                        status,
                        updated_at,
                        pickups::picked_up_at.eq(Some(evidence.at)),
                        pickups::pickup_photo_url.eq(evidence.photo_url),
                    ))
                    .execute(conn),
                PickupStatus::Delivered => diesel::update(target)
                    .set((
                        status,
                        updated_at,
                        pickups::delivered_at.eq(Some(evidence.at)),
                        pickups::delivery_photo_url.eq(evidence.photo_url),
                    ))
                    .execute(conn),
                _ => diesel::update(target).set((status, updated_at)).execute(conn),
            }
            .context("Failed to update a pickup status.")?;
            Ok(updated == 1)
        })
        .await
    }

    #[tracing::instrument(name = "Fetching operator credentials", skip(self))]
    async fn operator_credentials(
        &self,
        username: &str,
    ) -> Result<Option<OperatorCredentials>, anyhow::Error> {
        use crate::schema::operators;
        let username = username.to_string();
        self.run(move |conn| {
            let row = operators::table
                .filter(operators::username.eq(username))
                .first::<OperatorRow>(conn)
                .optional()
                .context("Failed to perform a query to retrieve stored credentials.")?;
            Ok(row.map(|row| OperatorCredentials {
                operator_id: row.operator_id,
                password_hash: Secret::new(row.password_hash),
            }))
        })
        .await
    }

    #[tracing::instrument(name = "Applying a billing event", skip(self, change))]
    async fn apply_billing_event(
        &self,
        event_id: &str,
        event_type: &str,
        change: SubscriptionChange,
    ) -> Result<EventOutcome, anyhow::Error> {
        let event_id = event_id.to_string();
        let event_type = event_type.to_string();
        self.run(move |conn| {
            conn.transaction::<_, anyhow::Error, _>(|| {
                use crate::schema::processed_webhook_events;
                let recorded = diesel::insert_into(processed_webhook_events::table)
                    .values(ProcessedWebhookEvent {
                        event_id: &event_id,
                        event_type: &event_type,
                        processed_at: &Utc::now(),
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)
                    .context("Failed to record a billing event.")?;
                if recorded == 0 {
                    return Ok(EventOutcome::Duplicate);
                }
                let outcome = match change {
                    SubscriptionChange::Nothing => ChangeOutcome::NoChange,
                    SubscriptionChange::Create(new) => create_subscription(conn, new)?,
                    SubscriptionChange::Mirror {
                        billing_subscription_id,
                        status,
                        occurred_at,
                    } => mirror_subscription(conn, &billing_subscription_id, status, occurred_at)?,
                };
                Ok(EventOutcome::Applied(outcome))
            })
        })
        .await
    }
}

fn create_subscription(
    conn: &PgConnection,
    new: crate::domain::NewSubscription,
) -> Result<ChangeOutcome, anyhow::Error> {
    use crate::schema::{subscriptions, users};

    // Serializes creates for one user; a locking read of a missing
    // subscription row would lock nothing.
    let user = users::table
        .find(new.user_id)
        .select(users::id)
        .for_update()
        .first::<Uuid>(conn)
        .optional()
        .context("Failed to lock the subscribing user.")?;
    if user.is_none() {
        return Err(anyhow!("No profile for user {}.", new.user_id));
    }

    let live = subscriptions::table
        .filter(subscriptions::user_id.eq(new.user_id))
        .filter(subscriptions::status.ne(SubscriptionStatus::Cancelled.as_str()))
        .select(subscriptions::id)
        .first::<Uuid>(conn)
        .optional()
        .context("Failed to look for a live subscription.")?;
    if live.is_some() {
        return Ok(ChangeOutcome::CreateSkipped(
            CreateSkipReason::LiveSubscriptionExists,
        ));
    }
    let existing = subscriptions::table
        .filter(subscriptions::billing_subscription_id.eq(new.billing_subscription_id.as_str()))
        .select(subscriptions::id)
        .first::<Uuid>(conn)
        .optional()
        .context("Failed to look for a known billing subscription.")?;
    if existing.is_some() {
        return Ok(ChangeOutcome::CreateSkipped(
            CreateSkipReason::DuplicateBillingSubscription,
        ));
    }

    let id = Uuid::new_v4();
    let now = Utc::now();
    let window_start = new.schedule.window.start();
    let window_end = new.schedule.window.end();
    diesel::insert_into(subscriptions::table)
        .values(NewSubscriptionRow {
            id: &id,
            user_id: &new.user_id,
            plan_type: new.plan.plan_type.as_str(),
            frequency: new.plan.frequency.as_str(),
            pickup_day_1: new.schedule.first_day().as_str(),
            pickup_day_2: new.schedule.second_day().map(|day| day.as_str()),
            pickup_window_start: &window_start,
            pickup_window_end: &window_end,
            bag_count: i32::from(new.plan.bag_count.value()),
            status: SubscriptionStatus::Active.as_str(),
            billing_subscription_id: Some(new.billing_subscription_id.as_str()),
            billing_customer_id: new.billing_customer_id.as_deref(),
            created_at: &now,
            updated_at: &now,
        })
        .execute(conn)
        .context("Failed to insert a subscription.")?;

    let row = subscriptions::table
        .find(id)
        .first::<SubscriptionRow>(conn)
        .context("Failed to read back a new subscription.")?;
    Ok(ChangeOutcome::Created(Subscription::try_from(row)?))
}

fn mirror_subscription(
    conn: &PgConnection,
    billing_subscription_id: &str,
    target: SubscriptionStatus,
    occurred_at: Option<DateTime<Utc>>,
) -> Result<ChangeOutcome, anyhow::Error> {
    use crate::schema::subscriptions;

    let row = subscriptions::table
        .filter(subscriptions::billing_subscription_id.eq(billing_subscription_id))
        .for_update()
        .first::<SubscriptionRow>(conn)
        .optional()
        .context("Failed to lock a subscription.")?;
    let (mut subscription, last_event_at) = match row {
        None => return Ok(ChangeOutcome::UnknownSubscription),
        Some(row) => {
            let last_event_at = row.last_event_at;
            (Subscription::try_from(row)?, last_event_at)
        }
    };
    if is_outdated(last_event_at, occurred_at) {
        return Ok(ChangeOutcome::Outdated(subscription));
    }
    if let Some(at) = occurred_at {
        diesel::update(subscriptions::table.find(subscription.id))
            .set(subscriptions::last_event_at.eq(Some(at)))
            .execute(conn)
            .context("Failed to record the latest subscription event.")?;
    }

    match mirror_decision(subscription.status, target) {
        MirrorDecision::Unchanged => Ok(ChangeOutcome::Unchanged(subscription)),
        MirrorDecision::Ignore => Ok(ChangeOutcome::Ignored {
            subscription,
            to: target,
        }),
        MirrorDecision::Transition => {
            let now = Utc::now();
            let this = subscriptions::table.find(subscription.id);
            match target {
                SubscriptionStatus::Paused => diesel::update(this)
                    .set((
                        subscriptions::status.eq(target.as_str()),
                        subscriptions::updated_at.eq(now),
                        subscriptions::paused_at.eq(Some(now)),
                    ))
                    .execute(conn),
                SubscriptionStatus::Cancelled => diesel::update(this)
                    .set((
                        subscriptions::status.eq(target.as_str()),
                        subscriptions::updated_at.eq(now),
                        subscriptions::cancelled_at.eq(Some(now)),
                    ))
                    .execute(conn),
                SubscriptionStatus::Active => diesel::update(this)
                    .set((
                        subscriptions::status.eq(target.as_str()),
                        subscriptions::updated_at.eq(now),
                    ))
                    .execute(conn),
            }
            .context("Failed to update a subscription status.")?;

            let from = subscription.status;
            subscription.status = target;
            match target {
                SubscriptionStatus::Paused => subscription.paused_at = Some(now),
                SubscriptionStatus::Cancelled => subscription.cancelled_at = Some(now),
                SubscriptionStatus::Active => {}
            }
            Ok(ChangeOutcome::Transitioned { subscription, from })
        }
    }
}
