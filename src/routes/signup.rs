use crate::domain::{CustomerName, FieldErrors, NewProfile};
use crate::guards::AuthenticatedUser;
use crate::routes::{ApiError, Success};
use crate::store::{ProfileCreation, Store};
use anyhow::Context;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    name: String,
}

/// Creates the profile row for a user who just signed up with the auth
/// provider. Repeating the call is harmless.
#[tracing::instrument(
    name = "Creating a customer profile",
    skip(body, store, user),
    fields(user_id = %user.user_id)
)]
#[post("/auth/signup", data = "<body>")]
pub async fn create_profile(
    user: AuthenticatedUser,
    body: Json<SignupForm>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<Success>, ApiError> {
    let name = CustomerName::parse(body.into_inner().name).map_err(|e| {
        let mut fields = FieldErrors::default();
        fields.insert("name", e);
        ApiError::invalid_fields(fields)
    })?;
    let created = store
        .create_profile(NewProfile {
            id: user.user_id,
            email: user.email,
            name,
        })
        .await
        .context("Failed to create a customer profile.")?;
    if created == ProfileCreation::AlreadyExists {
        tracing::info!("Profile already exists");
    }
    Ok(Success::new())
}
