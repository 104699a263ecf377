use crate::domain::{Address, CustomerName, FieldErrors, PhoneNumber, ZipCode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Provider,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "customer" => Ok(Self::Customer),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            other => Err(format!("{} is not a user role.", other)),
        }
    }
}

/// The `users` row of a signed-up customer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Profile row created right after sign-up.
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub name: CustomerName,
}

/// Account settings as submitted, after trimming. Blank optional fields are
/// stored as null.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdate {
    pub name: CustomerName,
    pub phone: Option<String>,
    pub address_street: Option<String>,
    pub address_city: Option<String>,
    pub address_state: Option<String>,
    pub address_zip: Option<ZipCode>,
}

impl AccountUpdate {
    pub fn parse(
        name: &str,
        phone: Option<&str>,
        address_street: Option<&str>,
        address_city: Option<&str>,
        address_state: Option<&str>,
        address_zip: Option<&str>,
    ) -> Result<AccountUpdate, FieldErrors> {
        let mut errors = FieldErrors::default();
        let name = CustomerName::parse(name.to_string()).map_err(|e| errors.insert("name", e));
        let address_zip = match non_blank(address_zip) {
            None => Ok(None),
            Some(zip) => ZipCode::parse(&zip)
                .map(Some)
                .map_err(|_| errors.insert("addressZip", "Valid zip code is required")),
        };
        match (name, address_zip) {
            (Ok(name), Ok(address_zip)) => Ok(AccountUpdate {
                name,
                phone: non_blank(phone),
                address_street: non_blank(address_street),
                address_city: non_blank(address_city),
                address_state: non_blank(address_state),
                address_zip,
            }),
            _ => Err(errors),
        }
    }
}

/// Contact details captured at checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactUpdate {
    pub phone: PhoneNumber,
    pub address: Address,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
