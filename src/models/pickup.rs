use crate::domain::{Pickup, PickupStatus, PickupWindow};
use anyhow::anyhow;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Queryable)]
pub struct PickupRow {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub scheduled_date: NaiveDate,
    pub scheduled_window_start: String,
    pub scheduled_window_end: String,
    pub status: String,
    pub pickup_photo_url: Option<String>,
    pub delivery_photo_url: Option<String>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PickupRow> for Pickup {
    type Error = anyhow::Error;

    fn try_from(row: PickupRow) -> Result<Self, Self::Error> {
        Ok(Pickup {
            id: row.id,
            subscription_id: row.subscription_id,
            provider_id: row.provider_id,
            scheduled_date: row.scheduled_date,
            window: PickupWindow::parse(&row.scheduled_window_start, &row.scheduled_window_end)
                .map_err(|e| anyhow!(e))?,
            status: PickupStatus::try_from(row.status.as_str()).map_err(|e| anyhow!(e))?,
            pickup_photo_url: row.pickup_photo_url,
            delivery_photo_url: row.delivery_photo_url,
            picked_up_at: row.picked_up_at,
            delivered_at: row.delivered_at,
        })
    }
}
