use crate::schema::waitlist;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Insertable)]
#[table_name = "waitlist"]
pub struct NewWaitlistEntry<'a> {
    pub id: &'a Uuid,
    pub email: &'a str,
    pub zip_code: &'a str,
    pub created_at: &'a DateTime<Utc>,
}
