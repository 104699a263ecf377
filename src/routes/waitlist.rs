use crate::domain::{CustomerEmail, FieldErrors, ZipCode};
use crate::routes::{ApiError, Success};
use crate::store::{Store, WaitlistJoin};
use anyhow::Context;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitlistForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    zip_code: String,
}

impl WaitlistForm {
    fn validate(&self) -> Result<(CustomerEmail, ZipCode), FieldErrors> {
        let mut errors = FieldErrors::default();
        let email = CustomerEmail::parse(self.email.trim().to_string())
            .map_err(|_| errors.insert("email", "Valid email is required"));
        let zip_code = ZipCode::parse(&self.zip_code)
            .map_err(|_| errors.insert("zipCode", "Valid zip code is required"));
        match (email, zip_code) {
            (Ok(email), Ok(zip_code)) => Ok((email, zip_code)),
            _ => Err(errors),
        }
    }
}

#[tracing::instrument(
    name = "Joining the waitlist",
    skip(body, store),
    fields(email = %body.email, zip_code = %body.zip_code)
)]
#[post("/waitlist", data = "<body>")]
pub async fn join_waitlist(
    body: Json<WaitlistForm>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<Success>, ApiError> {
    let (email, zip_code) = body.validate()?;
    let joined = store
        .join_waitlist(&email, &zip_code)
        .await
        .context("Failed to store a waitlist entry.")?;
    Ok(match joined {
        WaitlistJoin::Joined => Success::with_message("You've been added to the waitlist!"),
        WaitlistJoin::AlreadyJoined => Success::with_message("You're already on the waitlist!"),
    })
}
