use crate::auth::Auth;
use crate::guards::{managed, OrStatus};
use anyhow::anyhow;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use secrecy::Secret;
use std::sync::Arc;
use uuid::Uuid;

/// The signed-in customer, resolved from an `Authorization: Bearer` token.
/// Handlers receive the user id explicitly through this guard.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    // prevents construction outside of this module
    _private: (),
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match from_request_result(request).await {
            Ok(user) => Outcome::Success(user),
            Err(failure) => Outcome::Error(failure),
        }
    }
}

async fn from_request_result(
    request: &Request<'_>,
) -> Result<AuthenticatedUser, (Status, anyhow::Error)> {
    let auth = managed::<Arc<dyn Auth>>(request)?;
    let token = bearer_token(request)?;
    let identity = auth
        .current_user(&token)
        .await
        .map_err(|e| (Status::InternalServerError, e))?
        .ok_or_else(|| (Status::Unauthorized, anyhow!("The access token was rejected.")))?;
    Ok(AuthenticatedUser {
        user_id: identity.id,
        email: identity.email,
        _private: (),
    })
}

fn bearer_token(request: &Request<'_>) -> Result<Secret<String>, (Status, anyhow::Error)> {
    let header_value = request
        .headers()
        .get_one("Authorization")
        .or_status(Status::Unauthorized, "The 'Authorization' header was missing.")?;
    let token = header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .or_status(Status::Unauthorized, "The authorization scheme was not 'Bearer'.")?;
    Ok(Secret::new(token.to_string()))
}

