//! Request handlers.

pub mod analysis;
pub mod jobs;
pub mod progress;
pub mod upload;

use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::error::ApiResult;
use crate::state::AppState;

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe: checks the object store and job store are reachable.
pub async fn ready(State(state): State<AppState>) -> ApiResult<Json<serde_json::Value>> {
    state.storage.check_connectivity().await?;
    state.jobstore.check_connectivity().await?;

    Ok(Json(json!({
        "status": "ready",
        "queue_length": state.queue.len().await.unwrap_or(0),
    })))
}
