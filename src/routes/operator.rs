use crate::domain::{PickupEvidence, PickupStatus};
use crate::guards::AuthenticatedOperator;
use crate::routes::ApiError;
use crate::store::Store;
use anyhow::Context;
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default)]
    status: String,
    photo_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupStatusChanged {
    pub id: Uuid,
    pub status: PickupStatus,
    pub status_label: &'static str,
}

/// Provider-side progress on a pickup. Every write is checked against the
/// pickup lifecycle and only lands if nobody moved the pickup meanwhile.
#[tracing::instrument(
    name = "Updating a pickup status",
    skip(operator, body, store),
    fields(operator = %operator.username, status = %body.status)
)]
#[post("/operator/pickups/<pickup_id>/status", data = "<body>")]
pub async fn update_pickup_status(
    pickup_id: &str,
    operator: AuthenticatedOperator,
    body: Json<StatusUpdate>,
    store: &State<Arc<dyn Store>>,
) -> Result<Json<PickupStatusChanged>, ApiError> {
    let pickup_id =
        Uuid::parse_str(pickup_id).map_err(|_| ApiError::NotFound("Pickup not found"))?;
    let body = body.into_inner();
    let target = PickupStatus::try_from(body.status.trim())
        .map_err(|_| ApiError::invalid("Unknown pickup status"))?;
    if target == PickupStatus::Skipped {
        return Err(ApiError::invalid("Only the customer can skip a pickup"));
    }

    let current = store
        .find_pickup(pickup_id)
        .await
        .context("Failed to fetch the pickup.")?
        .ok_or(ApiError::NotFound("Pickup not found"))?
        .pickup
        .status;
    let target = current
        .transition_to(target)
        .map_err(|e| ApiError::invalid(e.to_string()))?;

    let evidence = PickupEvidence {
        photo_url: body.photo_url.filter(|url| !url.trim().is_empty()),
        at: Utc::now(),
    };
    let advanced = store
        .advance_pickup(pickup_id, current, target, &evidence)
        .await
        .context("Failed to update the pickup status.")?;
    if !advanced {
        return Err(ApiError::Conflict("The pickup was updated by someone else"));
    }
    Ok(Json(PickupStatusChanged {
        id: pickup_id,
        status: target,
        status_label: target.label(),
    }))
}
