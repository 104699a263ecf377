mod calendar;
mod customer_email;
mod customer_name;
mod field_errors;
mod onboarding;
mod pickup;
mod plan;
mod profile;
mod schedule;
mod skip;
mod subscription;
mod support;
mod zip_code;

pub use calendar::*;
pub use customer_email::CustomerEmail;
pub use customer_name::CustomerName;
pub use field_errors::FieldErrors;
pub use onboarding::*;
pub use pickup::*;
pub use plan::*;
pub use profile::*;
pub use schedule::*;
pub use skip::*;
pub use subscription::*;
pub use support::*;
pub use zip_code::*;
