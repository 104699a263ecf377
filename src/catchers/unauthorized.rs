use crate::catchers::error_body;
use rocket::http::Header;
use rocket::serde::json::Json;
use serde_json::Value;

/// 401 under `/operator`: asks the client for Basic credentials.
#[catch(401)]
pub fn unauthorized_request_credentials() -> RequestBasicAuth {
    RequestBasicAuth::new()
}

struct RequestBasicAuthHeader;

impl<'h> From<RequestBasicAuthHeader> for Header<'h> {
    fn from(_: RequestBasicAuthHeader) -> Self {
        Header::new("WWW-Authenticate", r#"Basic realm="operator""#)
    }
}

#[derive(Responder)]
#[response(status = 401)]
pub struct RequestBasicAuth {
    inner: Json<Value>,
    basic_auth: RequestBasicAuthHeader,
}

impl RequestBasicAuth {
    fn new() -> RequestBasicAuth {
        RequestBasicAuth {
            inner: error_body("Unauthorized"),
            basic_auth: RequestBasicAuthHeader,
        }
    }
}
