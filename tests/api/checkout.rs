use crate::helpers::{spawn_app, BillingCall, TestApp, TestUser};
use chrono::Utc;
use freshfolds::domain::{format_long_date, PickupDay};

fn valid_draft() -> serde_json::Value {
    serde_json::json!({
        "planType": "medium",
        "frequency": "weekly",
        "pickupDay1": "wednesday",
        "pickupDay2": "",
        "pickupWindowStart": "10:00",
        "pickupWindowEnd": "12:00",
        "addressStreet": "1 Mill Ave",
        "addressCity": "Tempe",
        "addressState": "AZ",
        "addressZip": "85281",
        "phone": "(480) 555-0100",
    })
}

async fn create_session(app: &TestApp, user: &TestUser) -> String {
    let response = app
        .post_json("/create-checkout-session", Some(user), &valid_draft())
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn a_valid_draft_opens_a_checkout_session() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;

    // act
    let response = app
        .post_json("/create-checkout-session", Some(&user), &valid_draft())
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["sessionId"].as_str().unwrap().starts_with("cs_test_"));
    assert!(body["url"].is_string());
    assert_eq!(
        app.billing.calls(),
        vec![BillingCall::Checkout {
            user_id: user.user_id,
            price_id: "price_medium_weekly".into()
        }]
    );
    let profile: serde_json::Value = app
        .get("/customer/profile", Some(&user))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(profile["phone"], "(480) 555-0100");
    assert_eq!(profile["addressCity"], "Tempe");
    assert!(app.store.subscriptions_for(user.user_id).is_empty());
}

#[tokio::test]
async fn invalid_drafts_come_back_with_field_errors() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    let mut draft = valid_draft();
    draft["addressStreet"] = "  ".into();
    draft["addressZip"] = "852".into();
    draft["phone"] = "555-0100".into();

    // act
    let response = app
        .post_json("/create-checkout-session", Some(&user), &draft)
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["addressStreet"], "Address is required");
    assert_eq!(body["fields"]["addressZip"], "Valid zip code is required");
    assert_eq!(body["fields"]["phone"], "Valid phone number is required");
    assert!(body["fields"]["addressCity"].is_null());
    assert!(app.billing.calls().is_empty());
}

#[tokio::test]
async fn twice_weekly_needs_a_distinct_second_day() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    let test_cases = vec![
        (serde_json::json!(""), "missing"),
        (serde_json::json!("wednesday"), "same as the first"),
    ];

    for (second_day, description) in test_cases {
        let mut draft = valid_draft();
        draft["frequency"] = "twice_weekly".into();
        draft["pickupDay2"] = second_day;

        // act
        let response = app
            .post_json("/create-checkout-session", Some(&user), &draft)
            .await;

        // assert
        assert_eq!(
            response.status().as_u16(),
            400,
            "The second day was {}",
            description
        );
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(
            body["fields"]["pickupDay2"],
            "Select a second pickup day different from the first"
        );
    }

    let mut draft = valid_draft();
    draft["frequency"] = "twice_weekly".into();
    draft["pickupDay2"] = "saturday".into();
    let response = app
        .post_json("/create-checkout-session", Some(&user), &draft)
        .await;
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn customers_with_a_live_subscription_cannot_check_out_again() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    app.complete_checkout(&user, "sub_1").await;

    // act
    let response = app
        .post_json("/create-checkout-session", Some(&user), &valid_draft())
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
    assert!(app.billing.calls().is_empty());
}

#[tokio::test]
async fn checkout_requires_authentication() {
    // arrange
    let app = spawn_app().await;

    // act
    let response = app
        .post_json("/create-checkout-session", None, &valid_draft())
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn verification_needs_a_session_id() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;

    // act
    let response = app.get("/verify-checkout", Some(&user)).await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Missing session ID");
}

#[tokio::test]
async fn an_unpaid_session_does_not_verify() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    let session_id = create_session(&app, &user).await;

    // act
    let response = app
        .get(&format!("/verify-checkout?session_id={}", session_id), Some(&user))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn another_users_session_is_unauthorized() {
    // arrange
    let app = spawn_app().await;
    let owner = app.signed_up_user().await;
    let other = app.signed_up_user().await;
    let session_id = create_session(&app, &owner).await;
    app.billing.mark_paid(&session_id);

    // act
    let response = app
        .get(&format!("/verify-checkout?session_id={}", session_id), Some(&other))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn a_paid_session_reports_the_first_pickup() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    let session_id = create_session(&app, &user).await;
    app.billing.mark_paid(&session_id);
    let calendar = app.settings.service.calendar().unwrap();

    // act
    let response = app
        .get(&format!("/verify-checkout?session_id={}", session_id), Some(&user))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["subscription"]["pickupDay"], "Wednesday");
    assert_eq!(body["subscription"]["pickupWindow"], "10:00 AM - 12:00 PM");
    let expected = format_long_date(calendar.next_occurrence(PickupDay::Wednesday, Utc::now()));
    assert_eq!(body["subscription"]["firstPickupDate"], expected.as_str());
}
