use crate::helpers::spawn_app;
use freshfolds::domain::TicketStatus;

#[tokio::test]
async fn signup_creates_a_customer_profile() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user();

    // act
    let response = app
        .post_json(
            "/auth/signup",
            Some(&user),
            &serde_json::json!({"name": "  Ursula Le Guin "}),
        )
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let profile: serde_json::Value = app
        .get("/customer/profile", Some(&user))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(profile["email"], user.email.as_str());
    assert_eq!(profile["name"], "Ursula Le Guin");
    assert_eq!(profile["role"], "customer");
    assert!(profile["phone"].is_null());
}

#[tokio::test]
async fn signing_up_twice_is_harmless() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;

    // act
    let response = app
        .post_json(
            "/auth/signup",
            Some(&user),
            &serde_json::json!({"name": "Someone Else"}),
        )
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let profile: serde_json::Value = app
        .get("/customer/profile", Some(&user))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(profile["name"], "Ursula Le Guin");
}

#[tokio::test]
async fn signup_requires_a_name() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user();

    // act
    let response = app
        .post_json("/auth/signup", Some(&user), &serde_json::json!({"name": "   "}))
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["name"], "Name is required");
}

#[tokio::test]
async fn requests_without_a_valid_token_are_rejected_before_validation() {
    // arrange
    let app = spawn_app().await;
    let mut stranger = app.register_user();
    stranger.token = "not-a-real-token".into();

    // act
    let anonymous = app
        .put_json("/customer/account", None, &serde_json::json!({}))
        .await;
    let forged = app
        .put_json("/customer/account", Some(&stranger), &serde_json::json!({}))
        .await;

    // assert
    for response in [anonymous, forged] {
        assert_eq!(response.status().as_u16(), 401);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn a_missing_profile_is_a_404() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user();

    // act
    let response = app.get("/customer/profile", Some(&user)).await;

    // assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn account_updates_are_trimmed_and_blanks_become_null() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;

    // act
    let response = app
        .put_json(
            "/customer/account",
            Some(&user),
            &serde_json::json!({
                "name": " Ursula K. Le Guin ",
                "phone": "   ",
                "address_street": " 1 Mill Ave ",
                "address_city": "Tempe",
                "address_state": "AZ",
                "address_zip": "85281",
            }),
        )
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let profile: serde_json::Value = app
        .get("/customer/profile", Some(&user))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(profile["name"], "Ursula K. Le Guin");
    assert!(profile["phone"].is_null());
    assert_eq!(profile["addressStreet"], "1 Mill Ave");
    assert_eq!(profile["addressZip"], "85281");
}

#[tokio::test]
async fn account_updates_need_a_name_and_a_well_formed_zip() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;
    let test_cases = vec![
        (serde_json::json!({"phone": "4805550100"}), "name"),
        (serde_json::json!({"name": "", "phone": "4805550100"}), "name"),
        (
            serde_json::json!({"name": "Ursula", "address_zip": "852"}),
            "addressZip",
        ),
    ];

    for (body, field) in test_cases {
        // act
        let response = app.put_json("/customer/account", Some(&user), &body).await;

        // assert
        assert_eq!(response.status().as_u16(), 400, "Payload: {}", body);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["fields"][field].is_string(), "No error on {}", field);
    }
}

#[tokio::test]
async fn updating_an_account_without_a_profile_is_a_404() {
    // arrange
    let app = spawn_app().await;
    let user = app.register_user();

    // act
    let response = app
        .put_json(
            "/customer/account",
            Some(&user),
            &serde_json::json!({"name": "Ursula"}),
        )
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn support_messages_must_be_at_least_ten_characters() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;

    // act
    let response = app
        .post_json(
            "/customer/support",
            Some(&user),
            &serde_json::json!({"subject": "Bags", "message": "  too short    "}),
        )
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body["fields"]["message"],
        "Message must be at least 10 characters"
    );
    assert!(app.store.support_tickets().is_empty());
}

#[tokio::test]
async fn a_support_request_opens_a_customer_ticket() {
    // arrange
    let app = spawn_app().await;
    let user = app.signed_up_user().await;

    // act
    let response = app
        .post_json(
            "/customer/support",
            Some(&user),
            &serde_json::json!({
                "subject": " Missing sock ",
                "message": "One sock did not come back from the last pickup.",
            }),
        )
        .await;

    // assert
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let tickets = app.store.support_tickets();
    assert_eq!(tickets.len(), 1);
    assert_eq!(body["ticketId"], tickets[0].id.to_string());
    assert_eq!(tickets[0].user_id, user.user_id);
    assert_eq!(tickets[0].subject, "Missing sock");
    assert_eq!(tickets[0].status, TicketStatus::Open);
}
