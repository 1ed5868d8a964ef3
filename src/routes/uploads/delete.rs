use crate::{AppState, routes::ApiError};
use axum::{
    Json,
    extract::{Path, State},
};
use axum_extra::extract::WithRejection;
use serde::Serialize;

#[derive(Serialize)]
pub struct DeleteUploadResponse {
    success: bool,
    message: &'static str,
}

/// Always succeeds for a well-formed code, whether or not it still existed.
pub async fn delete_upload_handler(
    State(state): State<AppState>,
    WithRejection(Path(code), _): WithRejection<Path<String>, ApiError>,
) -> Result<Json<DeleteUploadResponse>, ApiError> {
    state.access.delete_record(&code)?;
    Ok(Json(DeleteUploadResponse {
        success: true,
        message: "File deleted",
    }))
}
