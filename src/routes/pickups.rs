use crate::domain::{
    can_skip, earliest_skippable_date, format_long_date, Pickup, PickupStatus, ServiceCalendar,
};
use crate::guards::AuthenticatedUser;
use crate::routes::{ApiError, Success};
use crate::store::Store;
use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rocket::serde::json::Json;
use rocket::State;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupView {
    pub id: Uuid,
    pub scheduled_date: NaiveDate,
    pub date_label: String,
    pub window_label: String,
    pub status: PickupStatus,
    pub status_label: &'static str,
    pub can_skip: bool,
    pub pickup_photo_url: Option<String>,
    pub delivery_photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PickupList {
    pub upcoming: Vec<PickupView>,
    pub past: Vec<PickupView>,
}

impl PickupView {
    fn new(pickup: Pickup, now: NaiveDateTime) -> PickupView {
        PickupView {
            id: pickup.id,
            scheduled_date: pickup.scheduled_date,
            date_label: format_long_date(pickup.scheduled_date),
            window_label: pickup.window.label(),
            status: pickup.status,
            status_label: pickup.status.label(),
            can_skip: can_skip(pickup.status, pickup.scheduled_date, now),
            pickup_photo_url: pickup.pickup_photo_url,
            delivery_photo_url: pickup.delivery_photo_url,
        }
    }
}

/// Upcoming: today or later and not yet delivered, soonest first. Past:
/// everything else, most recent first.
fn split_pickups(pickups: Vec<Pickup>, now: NaiveDateTime) -> PickupList {
    let today = now.date();
    let (upcoming, mut past): (Vec<_>, Vec<_>) = pickups
        .into_iter()
        .map(|pickup| PickupView::new(pickup, now))
        .partition(|view| {
            view.scheduled_date >= today && view.status != PickupStatus::Delivered
        });
    past.reverse();
    PickupList { upcoming, past }
}

#[tracing::instrument(name = "Listing pickups", skip(user, store, calendar), fields(user_id = %user.user_id))]
#[get("/customer/pickups")]
pub async fn list_pickups(
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    calendar: &State<ServiceCalendar>,
) -> Result<Json<PickupList>, ApiError> {
    let pickups = store
        .list_pickups(user.user_id)
        .await
        .context("Failed to list pickups.")?;
    Ok(Json(split_pickups(pickups, calendar.local_now(Utc::now()))))
}

#[tracing::instrument(
    name = "Skipping a pickup",
    skip(user, store, calendar),
    fields(user_id = %user.user_id)
)]
#[post("/customer/pickups/<pickup_id>/skip")]
pub async fn skip_pickup(
    pickup_id: &str,
    user: AuthenticatedUser,
    store: &State<Arc<dyn Store>>,
    calendar: &State<ServiceCalendar>,
) -> Result<Json<Success>, ApiError> {
    let pickup_id =
        Uuid::parse_str(pickup_id).map_err(|_| ApiError::NotFound("Pickup not found"))?;
    let owned = store
        .find_pickup(pickup_id)
        .await
        .context("Failed to fetch the pickup.")?
        .ok_or(ApiError::NotFound("Pickup not found"))?;
    if owned.owner_id != user.user_id {
        return Err(ApiError::Unauthorized);
    }

    let now = calendar.local_now(Utc::now());
    if !can_skip(owned.pickup.status, owned.pickup.scheduled_date, now) {
        return Err(ApiError::invalid(
            "This pickup can no longer be skipped. Pickups must be skipped at least 24 hours in advance.",
        ));
    }
    let skipped = store
        .skip_pickup(pickup_id, earliest_skippable_date(now))
        .await
        .context("Failed to skip the pickup.")?;
    if !skipped {
        return Err(ApiError::invalid("This pickup can no longer be skipped."));
    }
    Ok(Success::new())
}
