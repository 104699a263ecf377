use crate::guards::OrStatus;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// The raw signature header of an inbound billing webhook. Checking it is
/// up to `WebhookVerifier`, which also needs the body.
pub struct BillingSignature(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for BillingSignature {
    type Error = anyhow::Error;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request
            .headers()
            .get_one(SIGNATURE_HEADER)
            .or_status(Status::BadRequest, "The signature header was missing.")
        {
            Ok(header) => Outcome::Success(BillingSignature(header.to_string())),
            Err(failure) => Outcome::Error(failure),
        }
    }
}
