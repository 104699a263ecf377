use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::Request;
use serde_json::{json, Value};

pub fn error_body(message: &str) -> Json<Value> {
    Json(json!({ "error": message }))
}

#[catch(400)]
pub fn bad_request() -> Json<Value> {
    error_body("Invalid request")
}

/// Bodies that parse as JSON but do not fit the expected shape.
#[catch(422)]
pub fn unprocessable_entity_to_bad_request(_req: &Request) -> Custom<Json<Value>> {
    Custom(Status::BadRequest, error_body("Invalid request"))
}

#[catch(401)]
pub fn unauthenticated() -> Json<Value> {
    error_body("Unauthorized")
}

#[catch(404)]
pub fn not_found() -> Json<Value> {
    error_body("Not found")
}

#[catch(500)]
pub fn internal_error() -> Json<Value> {
    error_body("Something went wrong. Please try again.")
}
