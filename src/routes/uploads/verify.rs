use crate::{AppState, routes::ApiError};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Default)]
pub struct VerifyPasswordRequest {
    #[serde(default)]
    password: Option<String>,
}

impl VerifyPasswordRequest {
    /// Clients may post nothing at all, or JSON without a JSON content type.
    fn from_body(body: &[u8]) -> Result<Self, ApiError> {
        if body.trim_ascii().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|err| ApiError::BadRequest(format!("invalid request body: {err}")))
    }
}

#[derive(Serialize)]
pub struct VerifyPasswordResponse {
    success: bool,
}

pub async fn verify_password_handler(
    State(state): State<AppState>,
    WithRejection(Path(code), _): WithRejection<Path<String>, ApiError>,
    WithRejection(body, _): WithRejection<Bytes, ApiError>,
) -> Result<Json<VerifyPasswordResponse>, ApiError> {
    let request = VerifyPasswordRequest::from_body(&body)?;
    state
        .access
        .verify_password(&code, request.password.as_deref())?;
    Ok(Json(VerifyPasswordResponse { success: true }))
}
