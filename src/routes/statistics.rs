use crate::{AppState, storage::StorageStats};
use axum::{Json, extract::State};

pub async fn statistics_handler(State(state): State<AppState>) -> Json<StorageStats> {
    Json(state.access.stats())
}
