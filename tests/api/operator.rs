use crate::helpers::{spawn_app, TestApp, TestOperator};
use chrono::{Duration, Utc};
use freshfolds::domain::PickupStatus;
use uuid::Uuid;

async fn post_status(
    app: &TestApp,
    pickup_id: &str,
    operator: Option<&TestOperator>,
    body: &serde_json::Value,
) -> reqwest::Response {
    let mut request = app
        .api_client
        .post(&format!(
            "{}/operator/pickups/{}/status",
            &app.address, pickup_id
        ))
        .json(body);
    if let Some(operator) = operator {
        request = request.basic_auth(&operator.username, Some(&operator.password));
    }
    request.send().await.expect("Failed to execute request.")
}

async fn scheduled_pickup(app: &TestApp) -> Uuid {
    let user = app.signed_up_user().await;
    app.complete_checkout(&user, &format!("sub_{}", Uuid::new_v4()))
        .await;
    let date = Utc::now().date_naive() + Duration::days(1);
    app.add_pickup(&user, date, PickupStatus::Scheduled)
}

#[tokio::test]
async fn requests_without_credentials_are_challenged() {
    // arrange
    let app = spawn_app().await;
    let pickup_id = scheduled_pickup(&app).await;

    // act
    let response = post_status(
        &app,
        &pickup_id.to_string(),
        None,
        &serde_json::json!({"status": "picked_up"}),
    )
    .await;

    // assert
    assert_eq!(response.status().as_u16(), 401);
    assert_eq!(
        response.headers()["WWW-Authenticate"],
        r#"Basic realm="operator""#
    );
    assert_eq!(
        app.store.pickup(pickup_id).unwrap().status,
        PickupStatus::Scheduled
    );
}

#[tokio::test]
async fn bad_credentials_are_rejected() {
    // arrange
    let app = spawn_app().await;
    let pickup_id = scheduled_pickup(&app).await;
    let operator = app.add_operator();
    let test_cases = vec![
        (
            TestOperator {
                username: operator.username.clone(),
                password: Uuid::new_v4().to_string(),
            },
            "wrong password",
        ),
        (
            TestOperator {
                username: Uuid::new_v4().to_string(),
                password: operator.password.clone(),
            },
            "unknown username",
        ),
    ];

    for (credentials, description) in test_cases {
        // act
        let response = post_status(
            &app,
            &pickup_id.to_string(),
            Some(&credentials),
            &serde_json::json!({"status": "picked_up"}),
        )
        .await;

        // assert
        assert_eq!(
            response.status().as_u16(),
            401,
            "The API accepted an operator with a {}.",
            description
        );
    }
    assert_eq!(
        app.store.pickup(pickup_id).unwrap().status,
        PickupStatus::Scheduled
    );
}

#[tokio::test]
async fn picking_up_records_the_photo_and_time() {
    // arrange
    let app = spawn_app().await;
    let pickup_id = scheduled_pickup(&app).await;
    let operator = app.add_operator();

    // act
    let response = post_status(
        &app,
        &pickup_id.to_string(),
        Some(&operator),
        &serde_json::json!({"status": "picked_up", "photoUrl": "https://photos.test/porch.jpg"}),
    )
    .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "picked_up");
    assert_eq!(body["statusLabel"], "Picked Up");
    let pickup = app.store.pickup(pickup_id).unwrap();
    assert_eq!(pickup.status, PickupStatus::PickedUp);
    assert_eq!(
        pickup.pickup_photo_url.as_deref(),
        Some("https://photos.test/porch.jpg")
    );
    assert!(pickup.picked_up_at.is_some());
    assert!(pickup.delivered_at.is_none());
}

#[tokio::test]
async fn a_pickup_walks_through_to_delivery() {
    // arrange
    let app = spawn_app().await;
    let pickup_id = scheduled_pickup(&app).await;
    let operator = app.add_operator();

    // act
    for status in ["picked_up", "washing", "ready", "out_for_delivery", "delivered"] {
        let response = post_status(
            &app,
            &pickup_id.to_string(),
            Some(&operator),
            &serde_json::json!({"status": status}),
        )
        .await;
        assert_eq!(response.status().as_u16(), 200, "Moving to {} failed.", status);
    }

    // assert
    let pickup = app.store.pickup(pickup_id).unwrap();
    assert_eq!(pickup.status, PickupStatus::Delivered);
    assert!(pickup.delivered_at.is_some());
}

#[tokio::test]
async fn illegal_status_changes_are_rejected() {
    // arrange
    let app = spawn_app().await;
    let pickup_id = scheduled_pickup(&app).await;
    let operator = app.add_operator();
    let test_cases = vec![
        ("washing", "skipping the pickup step"),
        ("delivered", "jumping to the end"),
        ("skipped", "skipping on the customer's behalf"),
        ("lost", "an unknown status"),
        ("", "a missing status"),
    ];

    for (status, description) in test_cases {
        // act
        let response = post_status(
            &app,
            &pickup_id.to_string(),
            Some(&operator),
            &serde_json::json!({"status": status}),
        )
        .await;

        // assert
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not reject {}.",
            description
        );
    }
    assert_eq!(
        app.store.pickup(pickup_id).unwrap().status,
        PickupStatus::Scheduled
    );
}

#[tokio::test]
async fn finished_pickups_cannot_move() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    app.complete_checkout(&user, "sub_1").await;
    let pickup_id = app.add_pickup(
        &user,
        Utc::now().date_naive() + Duration::days(2),
        PickupStatus::NoBags,
    );
    let operator = app.add_operator();

    // act
    let response = post_status(
        &app,
        &pickup_id.to_string(),
        Some(&operator),
        &serde_json::json!({"status": "picked_up"}),
    )
    .await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn unknown_pickups_are_not_found() {
    // arrange
    let app = spawn_app().await;
    let operator = app.add_operator();

    for pickup_id in [Uuid::new_v4().to_string(), "not-a-uuid".to_string()] {
        // act
        let response = post_status(
            &app,
            &pickup_id,
            Some(&operator),
            &serde_json::json!({"status": "picked_up"}),
        )
        .await;

        // assert
        assert_eq!(response.status().as_u16(), 404);
    }
}
