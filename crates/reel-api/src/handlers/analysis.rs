//! Video duration analysis.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use reel_models::{plan_segments, seed_for_job, CuttingOptions, JobId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const PROBE_URL_EXPIRY: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize)]
pub struct AnalyzeDurationRequest {
    pub s3_key: String,
    pub cutting_options: CuttingOptions,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeDurationResponse {
    pub total_duration: f64,
    pub num_segments: u32,
    pub segment_durations: Vec<f64>,
}

/// Probe a stored source and preview its segmentation.
///
/// Random policies are previewed with a seed derived from the blob key, so
/// repeated calls return the same estimate.
pub async fn analyze_duration(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeDurationRequest>,
) -> ApiResult<Json<AnalyzeDurationResponse>> {
    request.cutting_options.validate().map_err(ApiError::from)?;

    let url = state
        .storage
        .presign_get(&request.s3_key, PROBE_URL_EXPIRY)
        .await?;

    let info = reel_media::probe_url(&url).await.map_err(ApiError::from)?;

    let seed = seed_for_job(&JobId::from_string(request.s3_key));
    let plan = plan_segments(info.duration, &request.cutting_options, seed)
        .map_err(ApiError::from)?;

    Ok(Json(AnalyzeDurationResponse {
        total_duration: info.duration,
        num_segments: plan.num_segments(),
        segment_durations: plan.segment_durations(),
    }))
}
