//! Upload coordinator handlers.
//!
//! Single-shot and multi-part direct-to-object-store uploads. The
//! coordinator is stateless between calls: the client carries the session
//! identifier and the collected part tags.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use reel_models::{CuttingOptions, JobId, JobRecord, TextInput, TextStrategy, UploadMetadata};
use reel_queue::ProcessVideoJob;
use reel_storage::{chunk_plan, source_key, CompletedPartSpec, DEFAULT_PRESIGN_EXPIRY};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Expiry for the probe's read URL; probing takes seconds, not an hour.
const PROBE_URL_EXPIRY: std::time::Duration = std::time::Duration::from_secs(300);

// ============================================================================
// Wire models
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct InitiateUploadRequest {
    #[validate(length(min = 1, max = 512))]
    pub filename: String,
    #[validate(length(min = 1))]
    pub content_type: String,
    #[validate(range(min = 1))]
    pub file_size: u64,
    /// Client-is-mobile hint for chunk sizing
    #[serde(default)]
    pub is_mobile: bool,
}

#[derive(Debug, Serialize)]
pub struct InitiateUploadResponse {
    pub presigned_url: String,
    pub s3_key: String,
    pub job_id: JobId,
}

#[derive(Debug, Serialize)]
pub struct InitiateMultipartResponse {
    pub upload_id: String,
    pub s3_key: String,
    pub job_id: JobId,
    pub chunk_size: u64,
    pub max_concurrent_uploads: u32,
}

#[derive(Debug, Deserialize)]
pub struct UploadPartRequest {
    pub upload_id: String,
    pub s3_key: String,
    pub part_number: i32,
    #[allow(dead_code)]
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadPartResponse {
    pub presigned_url: String,
    pub part_number: i32,
}

#[derive(Debug, Deserialize)]
pub struct FinalizeMultipartRequest {
    pub upload_id: String,
    pub s3_key: String,
    pub parts: Vec<CompletedPartSpec>,
}

#[derive(Debug, Serialize)]
pub struct FinalizeMultipartResponse {
    pub s3_url: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteMultipartRequest {
    pub upload_id: String,
    pub s3_key: String,
    pub job_id: JobId,
    pub parts: Vec<CompletedPartSpec>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cutting_options: Option<CuttingOptions>,
    #[serde(default)]
    pub text_strategy: Option<TextStrategy>,
    #[serde(default)]
    pub text_input: Option<TextInput>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AbortMultipartRequest {
    pub upload_id: String,
    pub s3_key: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteUploadRequest {
    pub s3_key: String,
    pub job_id: JobId,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub cutting_options: Option<CuttingOptions>,
    #[serde(default)]
    pub text_strategy: Option<TextStrategy>,
    #[serde(default)]
    pub text_input: Option<TextInput>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JobCreatedResponse {
    pub job_id: JobId,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Initiate a single-shot upload: one presigned PUT URL.
pub async fn initiate_upload(
    State(state): State<AppState>,
    Json(request): Json<InitiateUploadRequest>,
) -> ApiResult<Json<InitiateUploadResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let job_id = JobId::new();
    let s3_key = source_key(&job_id, &request.filename);

    let presigned_url = state
        .storage
        .presign_put(&s3_key, &request.content_type, DEFAULT_PRESIGN_EXPIRY)
        .await?;

    metrics::record_upload_initiated("single");
    info!(job_id = %job_id, key = %s3_key, "Initiated single-shot upload");

    Ok(Json(InitiateUploadResponse {
        presigned_url,
        s3_key,
        job_id,
    }))
}

/// Initiate a multi-part upload session with adaptive chunk sizing.
pub async fn initiate_multipart_upload(
    State(state): State<AppState>,
    Json(request): Json<InitiateUploadRequest>,
) -> ApiResult<Json<InitiateMultipartResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    let job_id = JobId::new();
    let s3_key = source_key(&job_id, &request.filename);
    let plan = chunk_plan(request.file_size, request.is_mobile);

    let upload_id = state
        .storage
        .initiate_multipart(&s3_key, &request.content_type)
        .await?;

    metrics::record_upload_initiated("multipart");
    info!(
        job_id = %job_id,
        key = %s3_key,
        chunk_size = plan.chunk_size,
        "Initiated multipart upload"
    );

    Ok(Json(InitiateMultipartResponse {
        upload_id,
        s3_key,
        job_id,
        chunk_size: plan.chunk_size,
        max_concurrent_uploads: plan.max_concurrent_uploads,
    }))
}

/// Presign one part of a multi-part upload.
pub async fn upload_part(
    State(state): State<AppState>,
    Json(request): Json<UploadPartRequest>,
) -> ApiResult<Json<UploadPartResponse>> {
    if request.part_number < 1 {
        return Err(ApiError::upload_session_invalid(
            "part_number must be >= 1",
        ));
    }

    let presigned_url = state
        .storage
        .presign_upload_part(
            &request.s3_key,
            &request.upload_id,
            request.part_number,
            DEFAULT_PRESIGN_EXPIRY,
        )
        .await?;

    Ok(Json(UploadPartResponse {
        presigned_url,
        part_number: request.part_number,
    }))
}

/// Finalize a multi-part upload without creating a job.
pub async fn finalize_multipart_upload(
    State(state): State<AppState>,
    Json(request): Json<FinalizeMultipartRequest>,
) -> ApiResult<Json<FinalizeMultipartResponse>> {
    if request.parts.is_empty() {
        return Err(ApiError::upload_session_invalid("no parts submitted"));
    }

    let s3_url = state
        .storage
        .complete_multipart(&request.s3_key, &request.upload_id, request.parts)
        .await
        .map_err(finalize_error)?;

    Ok(Json(FinalizeMultipartResponse { s3_url }))
}

/// Finalize a multi-part upload, create the job record, and enqueue it.
pub async fn complete_multipart_upload(
    State(state): State<AppState>,
    Json(request): Json<CompleteMultipartRequest>,
) -> ApiResult<Json<JobCreatedResponse>> {
    if request.parts.is_empty() {
        return Err(ApiError::upload_session_invalid("no parts submitted"));
    }

    state
        .storage
        .complete_multipart(&request.s3_key, &request.upload_id, request.parts)
        .await
        .map_err(finalize_error)?;

    let job_id = request.job_id.clone();
    enqueue_processing(
        &state,
        job_id.clone(),
        request.s3_key,
        UploadMetadata {
            filename: request.filename.unwrap_or_default(),
            file_size: request.file_size.unwrap_or_default(),
            content_type: request
                .content_type
                .unwrap_or_else(|| "video/mp4".to_string()),
            title: request.title,
        },
        request.cutting_options.unwrap_or_default(),
        resolve_text_input(request.text_strategy, request.text_input),
        request.user_id.unwrap_or_else(|| "anonymous".to_string()),
    )
    .await?;

    Ok(Json(JobCreatedResponse {
        job_id,
        status: "QUEUED".to_string(),
        message: "Upload complete, processing queued".to_string(),
    }))
}

/// Abort a multi-part upload session.
pub async fn abort_multipart_upload(
    State(state): State<AppState>,
    Json(request): Json<AbortMultipartRequest>,
) -> ApiResult<Json<MessageResponse>> {
    state
        .storage
        .abort_multipart(&request.s3_key, &request.upload_id)
        .await?;

    metrics::record_upload_aborted();

    Ok(Json(MessageResponse {
        message: "Upload aborted".to_string(),
    }))
}

/// Complete a single-shot upload: create the job record and enqueue it.
pub async fn complete_upload(
    State(state): State<AppState>,
    Json(request): Json<CompleteUploadRequest>,
) -> ApiResult<Json<JobCreatedResponse>> {
    if !state.storage.exists(&request.s3_key).await? {
        return Err(ApiError::SourceMissing(request.s3_key));
    }

    let job_id = request.job_id.clone();
    enqueue_processing(
        &state,
        job_id.clone(),
        request.s3_key,
        UploadMetadata {
            filename: request.filename.unwrap_or_default(),
            file_size: request.file_size.unwrap_or_default(),
            content_type: request
                .content_type
                .unwrap_or_else(|| "video/mp4".to_string()),
            title: request.title,
        },
        request.cutting_options.unwrap_or_default(),
        resolve_text_input(request.text_strategy, request.text_input),
        request.user_id.unwrap_or_else(|| "anonymous".to_string()),
    )
    .await?;

    Ok(Json(JobCreatedResponse {
        job_id,
        status: "QUEUED".to_string(),
        message: "Upload complete, processing queued".to_string(),
    }))
}

// ============================================================================
// Post-finalize hand-off
// ============================================================================

/// Create the QUEUED job record and put the job on the worker queue.
///
/// The duration probe is best-effort here; the worker re-probes the
/// downloaded bytes before planning.
async fn enqueue_processing(
    state: &AppState,
    job_id: JobId,
    s3_key: String,
    metadata: UploadMetadata,
    cutting_options: CuttingOptions,
    text_input: TextInput,
    user_id: String,
) -> ApiResult<()> {
    cutting_options.validate().map_err(ApiError::from)?;

    let video_duration = match state.storage.presign_get(&s3_key, PROBE_URL_EXPIRY).await {
        Ok(url) => match reel_media::probe_url(&url).await {
            Ok(info) => Some(info.duration),
            Err(e) => {
                warn!(job_id = %job_id, "Duration probe failed (non-fatal): {}", e);
                None
            }
        },
        Err(e) => {
            warn!(job_id = %job_id, "Probe presign failed (non-fatal): {}", e);
            None
        }
    };

    let mut record = JobRecord::new(job_id.clone(), &user_id, &s3_key, metadata.clone());
    if let Some(duration) = video_duration {
        record = record.with_duration(duration);
    }
    state.jobstore.create_job(&record).await?;

    let job = ProcessVideoJob::new(job_id.clone(), user_id, s3_key, cutting_options, text_input)
        .with_metadata(metadata)
        .with_duration(video_duration);

    state.queue.enqueue(&job).await?;
    metrics::record_job_enqueued();

    info!(job_id = %job_id, duration = ?video_duration, "Job queued for processing");
    Ok(())
}

/// Merge the top-level strategy tag into the text input.
fn resolve_text_input(
    strategy: Option<TextStrategy>,
    text_input: Option<TextInput>,
) -> TextInput {
    let mut input = text_input.unwrap_or_default();
    if let Some(strategy) = strategy {
        input.strategy = strategy;
    }
    input
}

fn finalize_error(e: reel_storage::StorageError) -> ApiError {
    match e {
        reel_storage::StorageError::MultipartFailed(msg) => {
            ApiError::upload_session_invalid(msg)
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiate_request_validation() {
        let ok = InitiateUploadRequest {
            filename: "clip.mp4".into(),
            content_type: "video/mp4".into(),
            file_size: 1024,
            is_mobile: false,
        };
        assert!(ok.validate().is_ok());

        let empty_name = InitiateUploadRequest {
            filename: "".into(),
            ..ok
        };
        assert!(empty_name.validate().is_err());
    }

    #[test]
    fn zero_size_rejected() {
        let req = InitiateUploadRequest {
            filename: "clip.mp4".into(),
            content_type: "video/mp4".into(),
            file_size: 0,
            is_mobile: false,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn strategy_tag_overrides_text_input() {
        let input = resolve_text_input(
            Some(TextStrategy::BaseVary),
            Some(TextInput::one_for_all("Hello")),
        );
        assert_eq!(input.strategy, TextStrategy::BaseVary);
        assert_eq!(input.base_text.as_deref(), Some("Hello"));

        let defaulted = resolve_text_input(None, None);
        assert_eq!(defaulted.strategy, TextStrategy::OneForAll);
    }
}
