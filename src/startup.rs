use crate::auth::{Auth, HttpAuthClient};
use crate::billing::{Billing, StripeClient, WebhookVerifier};
use crate::catchers::*;
use crate::configuration::Settings;
use crate::email::{Email, SesEmailClient};
use crate::port_saver;
use crate::port_saver::Port;
use crate::routes::*;
use crate::store::{PgStore, Store};
use anyhow::{anyhow, Context};
use rocket::config::LogLevel;
use rocket::data::{Limits, ToByteUnit};
use rocket::{Config, Ignite, Rocket};
use std::sync::Arc;

/// The external services the application talks to.
pub struct Collaborators {
    pub store: Arc<dyn Store>,
    pub billing: Arc<dyn Billing>,
    pub email: Arc<dyn Email>,
    pub auth: Arc<dyn Auth>,
}

impl Collaborators {
    /// Production adapters: Postgres, Stripe, SES and the hosted auth API.
    pub async fn from_settings(settings: &Settings) -> Result<Collaborators, anyhow::Error> {
        let store = PgStore::connect_lazy(&settings.database);
        store.run_migrations().await?;
        let billing = StripeClient::new(
            settings.billing.api_base_url.clone(),
            settings.billing.secret_key.clone(),
            settings.application.base_url.clone(),
            settings.billing.timeout(),
        )?;
        let email = SesEmailClient::from_settings(&settings.email_client).await?;
        let auth = HttpAuthClient::new(
            settings.auth.base_url.clone(),
            settings.auth.api_key.clone(),
            settings.auth.timeout(),
        )?;
        Ok(Collaborators {
            store: Arc::new(store),
            billing: Arc::new(billing),
            email: Arc::new(email),
            auth: Arc::new(auth),
        })
    }
}

pub struct Application {
    pub server: Rocket<Ignite>,
    pub port: Port,
}

impl Application {
    pub async fn build(
        settings: &Settings,
        collaborators: Collaborators,
    ) -> Result<Application, anyhow::Error> {
        let calendar = settings
            .service
            .calendar()
            .map_err(|e| anyhow!(e))
            .context("Invalid service calendar settings.")?;
        let verifier = WebhookVerifier::new(
            settings.billing.webhook_secret.clone(),
            settings.billing.webhook_tolerance(),
        );
        let (port_saver, port) = port_saver::create_pair();
        let server = rocket::custom(Config {
            address: settings.application.host,
            port: settings.application.port.unwrap_or(0),
            limits: Limits::default().limit("bytes", 1.mebibytes()),
            log_level: LogLevel::Off,
            ..Config::release_default()
        })
        .attach(port_saver)
        .manage(collaborators.store)
        .manage(collaborators.billing)
        .manage(collaborators.email)
        .manage(collaborators.auth)
        .manage(verifier)
        .manage(calendar)
        .mount(
            "/",
            routes![
                health,
                check_zip_code,
                join_waitlist,
                create_profile,
                get_profile,
                update_account,
                create_support_ticket,
                list_pickups,
                skip_pickup,
                get_subscription,
                change_subscription,
                create_checkout_session,
                verify_checkout,
                billing_webhook,
                update_pickup_status,
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unprocessable_entity_to_bad_request,
                unauthenticated,
                not_found,
                internal_error,
            ],
        )
        .register("/operator", catchers![unauthorized_request_credentials])
        .ignite()
        .await
        .context("Failed to ignite the server.")?;
        Ok(Application { server, port })
    }
}
