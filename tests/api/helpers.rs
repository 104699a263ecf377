use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use diesel::{Connection, PgConnection, RunQueryDsl};
use freshfolds::auth::{Auth, AuthIdentity};
use freshfolds::billing::{
    Billing, CheckoutCustomer, CheckoutMetadata, CheckoutSession, CheckoutSessionStatus,
};
use freshfolds::configuration::{get_configuration, Settings};
use freshfolds::domain::{
    CheckoutRequest, CustomerEmail, Frequency, Pickup, PickupDay, PickupSchedule, PickupStatus,
    PickupWindow, Plan, PlanType,
};
use freshfolds::startup::{Application, Collaborators};
use freshfolds::store::{InMemoryStore, PgStore};
use freshfolds::telemetry::{get_subscriber, init_subscriber};
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".into();
    let subscriber_name = "test".into();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber).expect("Failed to install the tracing subscriber.");
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber).expect("Failed to install the tracing subscriber.");
    }
});

pub struct TestApp {
    pub address: String,
    pub store: Arc<InMemoryStore>,
    pub billing: Arc<MockBilling>,
    pub email_client: Arc<MockEmail>,
    pub auth: Arc<FakeAuth>,
    pub settings: Settings,
    pub api_client: reqwest::Client,
}

pub struct TestUser {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

pub struct TestOperator {
    pub username: String,
    pub password: String,
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let settings = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = None;
        c.application.host = "127.0.0.1".parse().unwrap();
        c.billing.webhook_secret = Secret::new("whsec_test_secret".to_string());
        c
    };

    let store = Arc::new(InMemoryStore::new());
    let billing = Arc::new(MockBilling::default());
    let email_client = Arc::new(MockEmail::default());
    let auth = Arc::new(FakeAuth::default());
    let collaborators = Collaborators {
        store: store.clone(),
        billing: billing.clone(),
        email: email_client.clone(),
        auth: auth.clone(),
    };

    let app = Application::build(&settings, collaborators)
        .await
        .expect("Failed to build the application.");
    let port = app.port;
    let _ = tokio::spawn(app.server.launch());
    let port = port.get().await.expect("Failed to learn the bound port.");

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        store,
        billing,
        email_client,
        auth,
        settings,
        api_client: reqwest::Client::new(),
    }
}

/// A `PgStore` on a freshly created, migrated database, plus a direct
/// connection for seeding and inspecting rows.
pub struct TestDatabase {
    pub store: Arc<PgStore>,
    pub connection: PgConnection,
}

pub async fn spawn_database() -> TestDatabase {
    Lazy::force(&TRACING);

    let settings = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.database.database_name = Uuid::new_v4().to_string();
        c
    };
    setup_database(&settings);

    let store = PgStore::connect_lazy(&settings.database);
    store
        .run_migrations()
        .await
        .expect("Failed to migrate the database.");
    TestDatabase {
        store: Arc::new(store),
        connection: connect_to_database(&settings),
    }
}

fn setup_database(settings: &Settings) {
    let connection = connect_without_database(settings);
    diesel::sql_query(format!(
        "CREATE DATABASE \"{}\"",
        settings.database.database_name
    ))
    .execute(&connection)
    .expect("Failed to create the test database.");
}

fn connect_to_database(settings: &Settings) -> PgConnection {
    let connection_string = settings.database.connection_string();
    PgConnection::establish(connection_string.expose_secret())
        .expect("Failed to connect to Postgres.")
}

fn connect_without_database(settings: &Settings) -> PgConnection {
    let connection_string = settings.database.connection_string_without_database();
    PgConnection::establish(connection_string.expose_secret())
        .expect("Failed to connect to Postgres.")
}

impl TestApp {
    /// A user the auth provider knows, without a profile row yet.
    pub fn register_user(&self) -> TestUser {
        let user = TestUser {
            user_id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4()),
            token: Uuid::new_v4().to_string(),
        };
        self.auth.tokens.lock().unwrap().insert(
            user.token.clone(),
            AuthIdentity {
                id: user.user_id,
                email: user.email.clone(),
            },
        );
        user
    }

    /// A registered user who also completed the sign-up call.
    pub async fn signed_up_user(&self) -> TestUser {
        let user = self.register_user();
        let response = self
            .post_json(
                "/auth/signup",
                Some(&user),
                &serde_json::json!({"name": "Ursula Le Guin"}),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200);
        user
    }

    pub fn add_operator(&self) -> TestOperator {
        let operator = TestOperator {
            username: Uuid::new_v4().to_string(),
            password: Uuid::new_v4().to_string(),
        };
        let salt = SaltString::b64_encode(Uuid::new_v4().as_bytes()).unwrap();
        let password_hash = Argon2::default()
            .hash_password(operator.password.as_bytes(), &salt)
            .unwrap()
            .to_string();
        self.store
            .insert_operator(&operator.username, &password_hash);
        operator
    }

    pub async fn get(&self, path: &str, user: Option<&TestUser>) -> reqwest::Response {
        let mut request = self.api_client.get(&format!("{}{}", &self.address, path));
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post_json(
        &self,
        path: &str,
        user: Option<&TestUser>,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(&format!("{}{}", &self.address, path))
            .json(body);
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn put_json(
        &self,
        path: &str,
        user: Option<&TestUser>,
        body: &serde_json::Value,
    ) -> reqwest::Response {
        let mut request = self
            .api_client
            .put(&format!("{}{}", &self.address, path))
            .json(body);
        if let Some(user) = user {
            request = request.bearer_auth(&user.token);
        }
        request.send().await.expect("Failed to execute request.")
    }

    pub async fn post_webhook(&self, event: &serde_json::Value) -> reqwest::Response {
        let payload = serde_json::to_vec(event).unwrap();
        let signature = sign_webhook(
            self.settings.billing.webhook_secret.expose_secret(),
            Utc::now().timestamp(),
            &payload,
        );
        self.post_webhook_with_signature(payload, Some(&signature))
            .await
    }

    pub async fn post_webhook_with_signature(
        &self,
        payload: Vec<u8>,
        signature: Option<&str>,
    ) -> reqwest::Response {
        let mut request = self
            .api_client
            .post(&format!("{}/webhooks/billing", &self.address))
            .header("Content-Type", "application/json")
            .body(payload);
        if let Some(signature) = signature {
            request = request.header("Stripe-Signature", signature);
        }
        request.send().await.expect("Failed to execute request.")
    }

    /// Delivers the `checkout.session.completed` event that creates a weekly
    /// medium subscription for `user`.
    pub async fn complete_checkout(&self, user: &TestUser, billing_subscription_id: &str) {
        let metadata = metadata_for(user.user_id, default_plan(), monday_schedule());
        let response = self
            .post_webhook(&checkout_completed_event(
                &format!("evt_{}", Uuid::new_v4()),
                billing_subscription_id,
                &metadata,
            ))
            .await;
        assert_eq!(response.status().as_u16(), 200);
    }

    /// Seeds a pickup on the user's live subscription.
    pub fn add_pickup(&self, user: &TestUser, date: NaiveDate, status: PickupStatus) -> Uuid {
        let subscription = self
            .store
            .subscriptions_for(user.user_id)
            .into_iter()
            .next()
            .expect("The user has no subscription.");
        let id = Uuid::new_v4();
        self.store.insert_pickup(Pickup {
            id,
            subscription_id: subscription.id,
            provider_id: None,
            scheduled_date: date,
            window: PickupWindow::default(),
            status,
            pickup_photo_url: None,
            delivery_photo_url: None,
            picked_up_at: None,
            delivered_at: None,
        });
        id
    }
}

pub fn default_plan() -> Plan {
    Plan::new(PlanType::Medium, Frequency::Weekly)
}

pub fn monday_schedule() -> PickupSchedule {
    PickupSchedule::new(
        Frequency::Weekly,
        PickupDay::Monday,
        None,
        PickupWindow::default(),
    )
    .unwrap()
}

pub fn metadata_for(user_id: Uuid, plan: Plan, schedule: PickupSchedule) -> HashMap<String, String> {
    CheckoutMetadata {
        user_id,
        plan,
        schedule,
    }
    .to_pairs()
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

pub fn sign_webhook(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("{}.", timestamp).as_bytes());
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

pub fn checkout_completed_event(
    event_id: &str,
    billing_subscription_id: &str,
    metadata: &HashMap<String, String>,
) -> serde_json::Value {
    serde_json::json!({
        "id": event_id,
        "type": "checkout.session.completed",
        "data": { "object": {
            "id": format!("cs_{}", Uuid::new_v4()),
            "mode": "subscription",
            "customer": "cus_test",
            "subscription": billing_subscription_id,
            "metadata": metadata,
        }}
    })
}

pub fn subscription_updated_event(
    event_id: &str,
    billing_subscription_id: &str,
    status: &str,
    paused: bool,
) -> serde_json::Value {
    let pause_collection = match paused {
        true => serde_json::json!({"behavior": "void"}),
        false => serde_json::Value::Null,
    };
    serde_json::json!({
        "id": event_id,
        "type": "customer.subscription.updated",
        "data": { "object": {
            "id": billing_subscription_id,
            "status": status,
            "pause_collection": pause_collection,
        }}
    })
}

pub fn subscription_deleted_event(event_id: &str, billing_subscription_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": event_id,
        "type": "customer.subscription.deleted",
        "data": { "object": {
            "id": billing_subscription_id,
            "status": "canceled",
        }}
    })
}

pub fn payment_failed_event(event_id: &str, billing_subscription_id: &str) -> serde_json::Value {
    serde_json::json!({
        "id": event_id,
        "type": "invoice.payment_failed",
        "data": { "object": {
            "id": "in_test",
            "subscription": billing_subscription_id,
        }}
    })
}

#[derive(Default)]
pub struct FakeAuth {
    pub tokens: Mutex<HashMap<String, AuthIdentity>>,
}

#[async_trait]
impl Auth for FakeAuth {
    async fn current_user(
        &self,
        access_token: &Secret<String>,
    ) -> Result<Option<AuthIdentity>, anyhow::Error> {
        Ok(self
            .tokens
            .lock()
            .unwrap()
            .get(access_token.expose_secret())
            .cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingCall {
    Checkout { user_id: Uuid, price_id: String },
    Pause(String),
    Resume(String),
    Cancel(String),
}

#[derive(Default)]
pub struct MockBilling {
    pub calls: Mutex<Vec<BillingCall>>,
    pub sessions: Mutex<HashMap<String, CheckoutSessionStatus>>,
    pub fail: AtomicBool,
}

impl MockBilling {
    pub fn calls(&self) -> Vec<BillingCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mark_paid(&self, session_id: &str) {
        if let Some(session) = self.sessions.lock().unwrap().get_mut(session_id) {
            session.payment_status = "paid".to_string();
        }
    }

    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: BillingCall) -> Result<(), anyhow::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("The billing provider is unavailable."));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl Billing for MockBilling {
    async fn create_checkout_session(
        &self,
        customer: &CheckoutCustomer,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, anyhow::Error> {
        self.record(BillingCall::Checkout {
            user_id: customer.user_id,
            price_id: request.plan.price_id().to_string(),
        })?;
        let id = format!("cs_test_{}", Uuid::new_v4().to_simple());
        let status = CheckoutSessionStatus {
            id: id.clone(),
            payment_status: "unpaid".to_string(),
            metadata: metadata_for(customer.user_id, request.plan, request.schedule),
        };
        self.sessions.lock().unwrap().insert(id.clone(), status);
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.test/{}", id)),
            id,
        })
    }

    async fn retrieve_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<Option<CheckoutSessionStatus>, anyhow::Error> {
        Ok(self.sessions.lock().unwrap().get(session_id).cloned())
    }

    async fn pause_subscription(&self, billing_subscription_id: &str) -> Result<(), anyhow::Error> {
        self.record(BillingCall::Pause(billing_subscription_id.to_string()))
    }

    async fn resume_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<(), anyhow::Error> {
        self.record(BillingCall::Resume(billing_subscription_id.to_string()))
    }

    async fn cancel_subscription(
        &self,
        billing_subscription_id: &str,
    ) -> Result<(), anyhow::Error> {
        self.record(BillingCall::Cancel(billing_subscription_id.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub text: String,
}

#[derive(Default)]
pub struct MockEmail {
    pub sent_emails: Mutex<Vec<SentEmail>>,
}

impl MockEmail {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent_emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl freshfolds::email::Email for MockEmail {
    async fn send_email(
        &self,
        recipient: &CustomerEmail,
        subject: &str,
        _html_content: &str,
        text_content: &str,
    ) -> Result<(), anyhow::Error> {
        self.sent_emails.lock().unwrap().push(SentEmail {
            recipient: recipient.as_ref().to_string(),
            subject: subject.to_string(),
            text: text_content.to_string(),
        });
        Ok(())
    }
}
