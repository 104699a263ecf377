use crate::domain::ZipCode;
use crate::routes::ApiError;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipCheck {
    #[serde(default)]
    zip_code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipAvailability {
    pub available: bool,
    pub zip_code: String,
}

#[tracing::instrument(name = "Checking zip code availability", skip(body), fields(zip_code = %body.zip_code))]
#[post("/check-zip", data = "<body>")]
pub fn check_zip_code(body: Json<ZipCheck>) -> Result<Json<ZipAvailability>, ApiError> {
    let zip_code = ZipCode::parse(&body.zip_code).map_err(|_| ApiError::invalid("Invalid zip code"))?;
    Ok(Json(ZipAvailability {
        available: zip_code.is_serviced(),
        zip_code: zip_code.as_ref().to_string(),
    }))
}
