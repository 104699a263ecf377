use crate::domain::{AccountUpdate, Profile, SupportRequest};
use crate::guards::AuthenticatedUser;
use crate::routes::{ApiError, Success};
use crate::store::Store;
use anyhow::Context;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(name = "Fetching the profile", skip(user, store), fields(user_id = %user.user_id))]
#[get("/customer/profile")]
pub async fn get_profile(
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<Profile>, ApiError> {
    store
        .get_profile(user.user_id)
        .await
        .context("Failed to fetch the profile.")?
        .map(Json)
        .ok_or(ApiError::NotFound("Profile not found"))
}

#[derive(Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    name: String,
    phone: Option<String>,
    address_street: Option<String>,
    address_city: Option<String>,
    address_state: Option<String>,
    address_zip: Option<String>,
}

#[tracing::instrument(name = "Updating account settings", skip(body, user, store), fields(user_id = %user.user_id))]
#[put("/customer/account", data = "<body>")]
pub async fn update_account(
    user: AuthenticatedUser,
    body: Json<AccountForm>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<Success>, ApiError> {
    let update = AccountUpdate::parse(
        &body.name,
        body.phone.as_deref(),
        body.address_street.as_deref(),
        body.address_city.as_deref(),
        body.address_state.as_deref(),
        body.address_zip.as_deref(),
    )?;
    let updated = store
        .update_account(user.user_id, &update)
        .await
        .context("Failed to update account settings.")?;
    match updated {
        true => Ok(Success::new()),
        false => Err(ApiError::NotFound("Profile not found")),
    }
}

#[derive(Deserialize)]
pub struct SupportForm {
    #[serde(default)]
    subject: String,
    #[serde(default)]
    message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketCreated {
    success: bool,
    ticket_id: Uuid,
}

#[tracing::instrument(name = "Opening a support ticket", skip(body, user, store), fields(user_id = %user.user_id))]
#[post("/customer/support", data = "<body>")]
pub async fn create_support_ticket(
    user: AuthenticatedUser,
    body: Json<SupportForm>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<TicketCreated>, ApiError> {
    let request = SupportRequest::parse(&body.subject, &body.message)?;
    let ticket_id = store
        .create_support_ticket(user.user_id, &request)
        .await
        .context("Failed to store a support ticket.")?;
    Ok(Json(TicketCreated {
        success: true,
        ticket_id,
    }))
}
