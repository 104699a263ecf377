mod json;
mod unauthorized;

pub use json::*;
pub use unauthorized::*;
