use crate::domain::{Profile, Role};
use crate::schema::users;
use anyhow::anyhow;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Queryable)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub id: &'a Uuid,
    pub email: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub created_at: &'a DateTime<Utc>,
    pub updated_at: &'a DateTime<Utc>,
}

impl TryFrom<UserRow> for Profile {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Profile {
            id: row.id,
            email: row.email,
            name: row.name,
            phone: row.phone,
            address_street: row.address_street,
            address_city: row.address_city,
            address_state: row.address_state,
            address_zip: row.address_zip,
            role: Role::try_from(row.role.as_str()).map_err(|e| anyhow!(e))?,
            created_at: row.created_at,
        })
    }
}
