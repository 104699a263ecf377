use crate::guards::{managed, BasicAuth, OrStatus};
use crate::store::{OperatorCredentials, Store};
use anyhow::{anyhow, Context};
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use uuid::Uuid;

/// An operator whose Basic credentials match an argon2 hash in `operators`.
#[derive(Debug)]
pub struct AuthenticatedOperator {
    pub operator_id: Uuid,
    pub username: String,
    // prevents construction outside of this module
    _private: (),
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedOperator {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let basic_auth = match request.guard::<BasicAuth>().await {
            Outcome::Success(basic_auth) => basic_auth,
            Outcome::Error((_, e)) => return Outcome::Error((Status::Unauthorized, e)),
            Outcome::Forward(status) => return Outcome::Forward(status),
        };
        match from_request_result(request, basic_auth).await {
            Ok(operator) => Outcome::Success(operator),
            Err(failure) => Outcome::Error(failure),
        }
    }
}

#[tracing::instrument(name = "Validate operator credentials", skip_all, fields(username = %basic_auth.username))]
async fn from_request_result(
    request: &Request<'_>,
    basic_auth: BasicAuth,
) -> Result<AuthenticatedOperator, (Status, anyhow::Error)> {
    let store = managed::<Arc<dyn Store>>(request)?;
    let credentials = store
        .operator_credentials(&basic_auth.username)
        .await
        .map_err(|e| (Status::InternalServerError, e))?
        .or_status(Status::Unauthorized, "Unknown username.")?;

    let OperatorCredentials {
        operator_id,
        password_hash,
    } = credentials;
    let password = basic_auth.password;
    tokio::task::spawn_blocking(move || verify_password_hash(password_hash, password))
        .await
        .context("Failed to spawn a blocking task.")
        .map_err(|e| (Status::InternalServerError, e))?
        .map_err(|e| (Status::Unauthorized, e))?;

    Ok(AuthenticatedOperator {
        operator_id,
        username: basic_auth.username,
        _private: (),
    })
}

fn verify_password_hash(
    expected_password_hash: Secret<String>,
    password_candidate: Secret<String>,
) -> Result<(), anyhow::Error> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .context("Failed to parse hash in PHC string format.")?;
    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .map_err(|_| anyhow!("Invalid password."))
}
