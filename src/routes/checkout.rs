use crate::billing::{Billing, CheckoutCustomer, CheckoutMetadata};
use crate::domain::{format_long_date, CheckoutDraft, ContactUpdate, ServiceCalendar};
use crate::guards::AuthenticatedUser;
use crate::routes::ApiError;
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSessionCreated {
    pub session_id: String,
    pub url: Option<String>,
}

/// Revalidates the wizard's draft, stores the contact details and opens a
/// hosted checkout session. No subscription exists until the provider
/// reports the payment.
#[tracing::instrument(
    name = "Creating a checkout session",
    skip(user, draft, store, billing),
    fields(user_id = %user.user_id)
)]
#[post("/create-checkout-session", data = "<draft>")]
pub async fn create_checkout_session(
    user: AuthenticatedUser,
    draft: Json<CheckoutDraft>,
    store: &State<Arc<dyn Store>>,
    billing: &State<Arc<dyn Billing>>,
) -> Result<Json<CheckoutSessionCreated>, ApiError> {
    let request = draft.validate()?;

    let existing = store
        .live_subscription(user.user_id)
        .await
        .context("Failed to look up existing subscriptions.")?;
    if existing.is_some() {
        return Err(ApiError::invalid("You already have an active subscription."));
    }

    let contact = ContactUpdate {
        phone: request.phone.clone(),
        address: request.address.clone(),
    };
    let saved = store
        .update_contact(user.user_id, &contact)
        .await
        .context("Failed to save contact details.")?;
    if !saved {
        return Err(ApiError::NotFound("Profile not found"));
    }

    let customer = CheckoutCustomer {
        user_id: user.user_id,
        email: user.email,
    };
    let session = billing
        .create_checkout_session(&customer, &request)
        .await
        .context("Failed to create a checkout session.")?;
    Ok(Json(CheckoutSessionCreated {
        session_id: session.id,
        url: session.url,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedSchedule {
    pub pickup_day: &'static str,
    pub pickup_window: String,
    pub first_pickup_date: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutVerified {
    pub success: bool,
    pub subscription: ConfirmedSchedule,
}

#[tracing::instrument(
    name = "Verifying a checkout session",
    skip(user, billing, calendar),
    fields(user_id = %user.user_id)
)]
#[get("/verify-checkout?<session_id>")]
pub async fn verify_checkout(
    session_id: Option<&str>,
    user: AuthenticatedUser,
    billing: &State<Arc<dyn Billing>>,
    calendar: &State<ServiceCalendar>,
) -> Result<Json<CheckoutVerified>, ApiError> {
    let session_id = session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::invalid("Missing session ID"))?;
    let session = billing
        .retrieve_checkout_session(session_id)
        .await
        .context("Failed to retrieve the checkout session.")?
        .ok_or(ApiError::NotFound("Checkout session not found"))?;
    if session.user_id() != Some(user.user_id) {
        return Err(ApiError::Unauthorized);
    }
    if !session.is_paid() {
        return Err(ApiError::invalid("Payment not completed"));
    }

    let metadata = CheckoutMetadata::from_map(&session.metadata)
        .context("The checkout session carries unusable metadata.")?;
    let first_day = metadata.schedule.first_day();
    let first_pickup = calendar.next_occurrence(first_day, Utc::now());
    Ok(Json(CheckoutVerified {
        success: true,
        subscription: ConfirmedSchedule {
            pickup_day: first_day.label(),
            pickup_window: metadata.schedule.window.label(),
            first_pickup_date: format_long_date(first_pickup),
        },
    }))
}
