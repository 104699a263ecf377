use crate::schema::processed_webhook_events;
use chrono::{DateTime, Utc};

#[derive(Insertable)]
#[table_name = "processed_webhook_events"]
pub struct ProcessedWebhookEvent<'a> {
    pub event_id: &'a str,
    pub event_type: &'a str,
    pub processed_at: &'a DateTime<Utc>,
}
