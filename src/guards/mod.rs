mod authenticated_operator;
mod authenticated_user;
mod basic_auth;
mod billing_signature;

use anyhow::{anyhow, Context};
pub use authenticated_operator::*;
pub use authenticated_user::*;
pub use basic_auth::*;
pub use billing_signature::*;
use rocket::http::Status;
use rocket::Request;

trait OrStatus<T> {
    fn or_status(self, status: Status, context: &'static str)
        -> Result<T, (Status, anyhow::Error)>;
}

impl<T, E> OrStatus<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn or_status(
        self,
        status: Status,
        context: &'static str,
    ) -> Result<T, (Status, anyhow::Error)> {
        self.context(context).map_err(|e| (status, e))
    }
}

impl<T> OrStatus<T> for Option<T> {
    fn or_status(
        self,
        status: Status,
        context: &'static str,
    ) -> Result<T, (Status, anyhow::Error)> {
        self.ok_or_else(|| (status, anyhow!(context)))
    }
}

/// Managed state every guard relies on; missing state is a wiring bug.
fn managed<'r, T: Send + Sync + 'static>(
    request: &'r Request<'_>,
) -> Result<&'r T, (Status, anyhow::Error)> {
    request
        .rocket()
        .state::<T>()
        .or_status(Status::InternalServerError, "Required state is not managed.")
}
