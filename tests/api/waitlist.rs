use crate::helpers::spawn_app;

#[tokio::test]
async fn joining_twice_succeeds_and_keeps_one_entry() {
    // arrange
    let app = spawn_app().await;
    let body = serde_json::json!({"email": "ursula@example.com", "zipCode": "99999"});

    // act
    let first = app.post_json("/waitlist", None, &body).await;
    let second = app
        .post_json(
            "/waitlist",
            None,
            &serde_json::json!({"email": "Ursula@Example.com", "zipCode": "99999"}),
        )
        .await;

    // assert
    assert_eq!(first.status().as_u16(), 200);
    let first: serde_json::Value = first.json().await.unwrap();
    assert_eq!(first["success"], true);
    assert_eq!(first["message"], "You've been added to the waitlist!");

    assert_eq!(second.status().as_u16(), 200);
    let second: serde_json::Value = second.json().await.unwrap();
    assert_eq!(second["success"], true);
    assert_eq!(second["message"], "You're already on the waitlist!");

    assert_eq!(
        app.store.waitlist_entries(),
        vec![("ursula@example.com".to_string(), "99999".to_string())]
    );
}

#[tokio::test]
async fn the_same_email_may_wait_for_several_zip_codes() {
    // arrange
    let app = spawn_app().await;

    // act
    for zip in ["99999", "10001"] {
        let response = app
            .post_json(
                "/waitlist",
                None,
                &serde_json::json!({"email": "ursula@example.com", "zipCode": zip}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }

    // assert
    assert_eq!(app.store.waitlist_entries().len(), 2);
}

#[tokio::test]
async fn missing_or_invalid_fields_are_rejected() {
    // arrange
    let app = spawn_app().await;
    let test_cases = vec![
        (serde_json::json!({"zipCode": "99999"}), "email"),
        (serde_json::json!({"email": "ursula@example.com"}), "zipCode"),
        (
            serde_json::json!({"email": "definitely-not-an-email", "zipCode": "99999"}),
            "email",
        ),
        (
            serde_json::json!({"email": "ursula@example.com", "zipCode": "9999"}),
            "zipCode",
        ),
    ];

    for (body, field) in test_cases {
        // act
        let response = app.post_json("/waitlist", None, &body).await;

        // assert
        assert_eq!(response.status().as_u16(), 400, "Payload: {}", body);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["fields"][field].is_string(), "No error on {}", field);
    }
    assert!(app.store.waitlist_entries().is_empty());
}
