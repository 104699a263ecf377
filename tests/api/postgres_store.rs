use crate::helpers::{default_plan, monday_schedule, spawn_database, TestDatabase};
use chrono::{Duration, Utc};
use claim::assert_ok;
use diesel::prelude::*;
use freshfolds::domain::{
    CustomerEmail, CustomerName, NewProfile, NewSubscription, PickupStatus, SubscriptionStatus,
    ZipCode,
};
use freshfolds::schema::{processed_webhook_events, subscriptions, waitlist};
use freshfolds::store::{
    ChangeOutcome, CreateSkipReason, EventOutcome, Store, SubscriptionChange, WaitlistJoin,
};
use uuid::Uuid;

async fn add_profile(db: &TestDatabase) -> Uuid {
    let user_id = Uuid::new_v4();
    let profile = NewProfile {
        id: user_id,
        email: format!("{}@example.com", user_id.to_simple()),
        name: CustomerName::parse("Ursula Le Guin".into()).unwrap(),
    };
    assert_ok!(db.store.create_profile(profile).await);
    user_id
}

fn create(user_id: Uuid, billing_subscription_id: &str) -> SubscriptionChange {
    SubscriptionChange::Create(NewSubscription {
        user_id,
        plan: default_plan(),
        schedule: monday_schedule(),
        billing_subscription_id: billing_subscription_id.into(),
        billing_customer_id: Some("cus_1".into()),
    })
}

async fn add_subscription(db: &TestDatabase, user_id: Uuid) -> Uuid {
    let outcome = db
        .store
        .apply_billing_event("evt_checkout", "checkout.session.completed", create(user_id, "sub_1"))
        .await
        .unwrap();
    match outcome {
        EventOutcome::Applied(ChangeOutcome::Created(subscription)) => subscription.id,
        other => panic!("Expected a new subscription, got {:?}", other),
    }
}

fn live_subscriptions(db: &TestDatabase, user_id: Uuid) -> i64 {
    subscriptions::table
        .filter(subscriptions::user_id.eq(user_id))
        .filter(subscriptions::status.ne("cancelled"))
        .count()
        .get_result(&db.connection)
        .expect("Failed to count subscriptions.")
}

#[tokio::test]
async fn a_pickup_skipped_concurrently_is_skipped_exactly_once() {
    // arrange
    let db = spawn_database().await;
    let user_id = add_profile(&db).await;
    let subscription_id = add_subscription(&db, user_id).await;
    let pickup_id = Uuid::new_v4();
    let today = Utc::now().date_naive();
    diesel::sql_query(
        "INSERT INTO pickups \
         (id, subscription_id, scheduled_date, scheduled_window_start, scheduled_window_end) \
         VALUES ($1, $2, $3, '08:00', '10:00')",
    )
    .bind::<diesel::sql_types::Uuid, _>(pickup_id)
    .bind::<diesel::sql_types::Uuid, _>(subscription_id)
    .bind::<diesel::sql_types::Date, _>(today + Duration::days(10))
    .execute(&db.connection)
    .expect("Failed to insert the pickup.");

    // act
    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let store = db.store.clone();
            tokio::spawn(async move { store.skip_pickup(pickup_id, today).await })
        })
        .collect();
    let mut skipped = 0;
    for attempt in attempts {
        if attempt.await.unwrap().unwrap() {
            skipped += 1;
        }
    }

    // assert
    assert_eq!(skipped, 1);
    let pickup = db.store.find_pickup(pickup_id).await.unwrap().unwrap();
    assert_eq!(pickup.pickup.status, PickupStatus::Skipped);
    assert_eq!(pickup.owner_id, user_id);
}

#[tokio::test]
async fn a_pickup_inside_the_notice_period_is_not_skipped() {
    // arrange
    let db = spawn_database().await;
    let user_id = add_profile(&db).await;
    let subscription_id = add_subscription(&db, user_id).await;
    let pickup_id = Uuid::new_v4();
    let today = Utc::now().date_naive();
    diesel::sql_query(
        "INSERT INTO pickups \
         (id, subscription_id, scheduled_date, scheduled_window_start, scheduled_window_end) \
         VALUES ($1, $2, $3, '08:00', '10:00')",
    )
    .bind::<diesel::sql_types::Uuid, _>(pickup_id)
    .bind::<diesel::sql_types::Uuid, _>(subscription_id)
    .bind::<diesel::sql_types::Date, _>(today)
    .execute(&db.connection)
    .expect("Failed to insert the pickup.");

    // act
    let skipped = db
        .store
        .skip_pickup(pickup_id, today + Duration::days(1))
        .await
        .unwrap();

    // assert
    assert!(!skipped);
    let pickup = db.store.find_pickup(pickup_id).await.unwrap().unwrap();
    assert_eq!(pickup.pickup.status, PickupStatus::Scheduled);
}

#[tokio::test]
async fn a_redelivered_event_id_changes_nothing() {
    // arrange
    let db = spawn_database().await;
    let user_id = add_profile(&db).await;
    add_subscription(&db, user_id).await;

    // act
    let outcome = db
        .store
        .apply_billing_event("evt_checkout", "checkout.session.completed", create(user_id, "sub_2"))
        .await
        .unwrap();

    // assert
    assert_eq!(outcome, EventOutcome::Duplicate);
    let rows: i64 = subscriptions::table
        .count()
        .get_result(&db.connection)
        .unwrap();
    assert_eq!(rows, 1);
    let events: i64 = processed_webhook_events::table
        .count()
        .get_result(&db.connection)
        .unwrap();
    assert_eq!(events, 1);
}

#[tokio::test]
async fn concurrent_checkouts_for_one_user_create_one_live_subscription() {
    let db = spawn_database().await;

    for _ in 0..5 {
        // arrange
        let user_id = add_profile(&db).await;

        // act
        let checkouts: Vec<_> = (0..4)
            .map(|i| {
                let store = db.store.clone();
                let event_id = format!("evt_{}_{}", user_id.to_simple(), i);
                let billing_id = format!("sub_{}_{}", user_id.to_simple(), i);
                tokio::spawn(async move {
                    store
                        .apply_billing_event(
                            &event_id,
                            "checkout.session.completed",
                            create(user_id, &billing_id),
                        )
                        .await
                })
            })
            .collect();
        let mut created = 0;
        for checkout in checkouts {
            match checkout.await.unwrap().unwrap() {
                EventOutcome::Applied(ChangeOutcome::Created(_)) => created += 1,
                EventOutcome::Applied(ChangeOutcome::CreateSkipped(
                    CreateSkipReason::LiveSubscriptionExists,
                )) => {}
                other => panic!("Unexpected checkout outcome {:?}", other),
            }
        }

        // assert
        assert_eq!(created, 1);
        assert_eq!(live_subscriptions(&db, user_id), 1);
    }
}

#[tokio::test]
async fn an_older_subscription_update_is_ignored() {
    // arrange
    let db = spawn_database().await;
    let user_id = add_profile(&db).await;
    add_subscription(&db, user_id).await;
    let now = Utc::now();
    let mirror = |status, at| SubscriptionChange::Mirror {
        billing_subscription_id: "sub_1".into(),
        status,
        occurred_at: Some(at),
    };

    // act
    let paused = db
        .store
        .apply_billing_event(
            "evt_pause",
            "customer.subscription.updated",
            mirror(SubscriptionStatus::Paused, now),
        )
        .await
        .unwrap();
    let stale = db
        .store
        .apply_billing_event(
            "evt_resume",
            "customer.subscription.updated",
            mirror(SubscriptionStatus::Active, now - Duration::minutes(1)),
        )
        .await
        .unwrap();

    // assert
    assert!(matches!(
        paused,
        EventOutcome::Applied(ChangeOutcome::Transitioned { .. })
    ));
    match stale {
        EventOutcome::Applied(ChangeOutcome::Outdated(subscription)) => {
            assert_eq!(subscription.status, SubscriptionStatus::Paused)
        }
        other => panic!("Expected the update to be ignored, got {:?}", other),
    }
    let live = db.store.live_subscription(user_id).await.unwrap().unwrap();
    assert_eq!(live.status, SubscriptionStatus::Paused);
}

#[tokio::test]
async fn joining_the_waitlist_twice_keeps_one_entry() {
    // arrange
    let db = spawn_database().await;
    let email = CustomerEmail::parse("ursula@example.com".into()).unwrap();
    let zip_code = ZipCode::parse("10001").unwrap();

    // act
    let first = db.store.join_waitlist(&email, &zip_code).await.unwrap();
    let second = db.store.join_waitlist(&email, &zip_code).await.unwrap();

    // assert
    assert_eq!(first, WaitlistJoin::Joined);
    assert_eq!(second, WaitlistJoin::AlreadyJoined);
    let entries: i64 = waitlist::table.count().get_result(&db.connection).unwrap();
    assert_eq!(entries, 1);
}
