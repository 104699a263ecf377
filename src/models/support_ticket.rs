use crate::schema::support_tickets;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Insertable)]
#[table_name = "support_tickets"]
pub struct NewSupportTicket<'a> {
    pub id: &'a Uuid,
    pub user_id: &'a Uuid,
    pub ticket_type: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
    pub status: &'a str,
    pub created_at: &'a DateTime<Utc>,
    pub updated_at: &'a DateTime<Utc>,
}
