use crate::domain::{CustomerEmail, ServiceCalendar};
use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use serde_aux::field_attributes::deserialize_option_number_from_string;
use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub email_client: EmailClientSettings,
    pub billing: BillingSettings,
    pub auth: AuthSettings,
    pub service: ServiceSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_option_number_from_string")]
    pub port: Option<u16>,
    pub host: IpAddr,
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailClientSettings {
    pub sender_email: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct BillingSettings {
    pub api_base_url: String,
    pub secret_key: Secret<String>,
    pub webhook_secret: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub webhook_tolerance_seconds: i64,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    pub base_url: String,
    pub api_key: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

#[derive(serde::Deserialize, Clone)]
pub struct ServiceSettings {
    /// The service area's offset from UTC. Arizona keeps -420 all year.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub utc_offset_minutes: i32,
}

impl EmailClientSettings {
    pub fn sender(&self) -> Result<CustomerEmail, String> {
        CustomerEmail::parse(self.sender_email.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

impl BillingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn webhook_tolerance(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.webhook_tolerance_seconds)
    }
}

impl AuthSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

impl ServiceSettings {
    pub fn calendar(&self) -> Result<ServiceCalendar, String> {
        ServiceCalendar::from_utc_offset_minutes(self.utc_offset_minutes)
    }
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'local' or 'production'.",
                other
            )),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            self.database_name,
            ssl_mode(self.require_ssl)
        ))
    }

    pub fn connection_string_without_database(&self) -> Secret<String> {
        Secret::new(format!(
            "postgres://{}:{}@{}:{}?sslmode={}",
            self.username,
            self.password.expose_secret(),
            self.host,
            self.port,
            ssl_mode(self.require_ssl)
        ))
    }
}

fn ssl_mode(require_ssl: bool) -> &'static str {
    match require_ssl {
        true => "require",
        false => "prefer",
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().map_err(|e| {
        config::ConfigError::Message(format!(
            "Failed to determine the current directory: {}",
            e
        ))
    })?;
    let configuration_directory = base_path.join("configuration");
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;

    let mut settings = config::Config::default();
    settings.merge(config::File::from(configuration_directory.join("base")).required(true))?;
    settings.merge(
        config::File::from(configuration_directory.join(environment.as_str())).required(true),
    )?;
    settings.merge(config::Environment::with_prefix("app").separator("__"))?;
    settings.try_into()
}
