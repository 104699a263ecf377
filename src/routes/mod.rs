mod check_zip;
mod checkout;
mod customer;
mod health_check;
mod operator;
mod pickups;
mod signup;
mod subscription;
mod waitlist;
mod webhooks;

use crate::domain::FieldErrors;
pub use check_zip::*;
pub use checkout::*;
pub use customer::*;
pub use health_check::*;
pub use operator::*;
pub use pickups::*;
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::Request;
use serde::Serialize;
pub use signup::*;
pub use subscription::*;
pub use waitlist::*;
pub use webhooks::*;

pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Every way a route can fail. The variant picks the status code; the
/// message is what the client sees.
#[derive(thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: FieldErrors,
    },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(&'static str),
    #[error("Invalid signature")]
    InvalidSignature(#[source] crate::billing::WebhookError),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> ApiError {
        ApiError::Validation {
            message: message.into(),
            fields: FieldErrors::default(),
        }
    }

    pub fn invalid_fields(fields: FieldErrors) -> ApiError {
        ApiError::Validation {
            message: fields.first_message().unwrap_or("Invalid request").to_string(),
            fields,
        }
    }

    fn status(&self) -> Status {
        match self {
            ApiError::Validation { .. } | ApiError::InvalidSignature(_) => Status::BadRequest,
            ApiError::Unauthorized => Status::Unauthorized,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Conflict(_) => Status::Conflict,
            ApiError::Unexpected(_) => Status::InternalServerError,
        }
    }
}

impl From<FieldErrors> for ApiError {
    fn from(fields: FieldErrors) -> Self {
        ApiError::invalid_fields(fields)
    }
}

impl std::fmt::Debug for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();
        let body = match self {
            ApiError::Unexpected(_) => {
                tracing::error!(error.cause_chain = ?self, "Request failed");
                ErrorBody {
                    error: GENERIC_FAILURE.to_string(),
                    fields: None,
                }
            }
            ApiError::Validation { message, fields } => {
                tracing::info!(%message, "Request rejected");
                ErrorBody {
                    error: message,
                    fields: Some(fields).filter(|f| !f.is_empty()),
                }
            }
            other => {
                tracing::warn!(error.cause_chain = ?other, "Request rejected");
                ErrorBody {
                    error: other.to_string(),
                    fields: None,
                }
            }
        };
        Custom(status, Json(body)).respond_to(request)
    }
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(Serialize)]
pub struct Success {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl Success {
    pub fn new() -> Json<Success> {
        Json(Success {
            success: true,
            message: None,
        })
    }

    pub fn with_message(message: &'static str) -> Json<Success> {
        Json(Success {
            success: true,
            message: Some(message),
        })
    }
}
