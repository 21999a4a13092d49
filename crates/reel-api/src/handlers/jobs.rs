//! Job status handlers.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use reel_models::{JobId, JobStatus};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Job status response.
///
/// `output_urls` are short-lived signed read URLs regenerated from the
/// stored blob keys on every request.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_urls: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<f64>,
}

/// Get the current state of a job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let job_id = JobId::from_string(job_id);

    let record = state
        .jobstore
        .get_job(&job_id)
        .await?
        .ok_or_else(|| ApiError::job_not_found(job_id.to_string()))?;

    let output_urls = if record.output_keys.is_empty() {
        None
    } else {
        let mut urls = Vec::with_capacity(record.output_keys.len());
        for key in &record.output_keys {
            match state
                .storage
                .presign_get(key, state.config.output_url_expiry)
                .await
            {
                Ok(url) => urls.push(url),
                Err(e) => {
                    warn!(job_id = %record.job_id, key = key, "Presign failed: {}", e);
                }
            }
        }
        Some(urls)
    };

    Ok(Json(JobStatusResponse {
        job_id: record.job_id,
        status: record.status,
        progress: Some(record.progress),
        output_urls,
        error_message: record.error_message,
        created_at: record.created_at,
        updated_at: record.updated_at,
        video_duration: record.video_duration,
    }))
}
