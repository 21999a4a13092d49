//! API error types.
//!
//! The core propagates tagged errors; this is the single place they map to
//! HTTP statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use reel_models::PlanError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Source not found: {0}")]
    SourceMissing(String),

    #[error("Invalid video: {0}")]
    InvalidVideo(String),

    #[error("Video too short: {0}")]
    VideoTooShort(String),

    #[error("Bad cutting policy: {0}")]
    BadPolicy(String),

    #[error("Invalid upload session: {0}")]
    UploadSessionInvalid(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Job store error: {0}")]
    JobStore(#[from] reel_jobstore::JobStoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] reel_queue::QueueError),
}

impl ApiError {
    pub fn job_not_found(job_id: impl Into<String>) -> Self {
        Self::JobNotFound(job_id.into())
    }

    pub fn upload_session_invalid(msg: impl Into<String>) -> Self {
        Self::UploadSessionInvalid(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::SourceMissing(_) | ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidVideo(_)
            | ApiError::VideoTooShort(_)
            | ApiError::BadPolicy(_)
            | ApiError::UploadSessionInvalid(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Storage(reel_storage::StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::JobStore(_)
            | ApiError::Queue(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::VideoTooShort { .. } => ApiError::VideoTooShort(e.to_string()),
            PlanError::BadPolicy(msg) => ApiError::BadPolicy(msg),
            PlanError::InvalidDuration(_) => ApiError::InvalidVideo(e.to_string()),
        }
    }
}

impl From<reel_media::MediaError> for ApiError {
    fn from(e: reel_media::MediaError) -> Self {
        match e {
            reel_media::MediaError::SourceMissing(msg) => ApiError::SourceMissing(msg),
            reel_media::MediaError::InvalidVideo(msg) => ApiError::InvalidVideo(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::JobStore(_)
            | ApiError::Queue(_)
                if status == StatusCode::INTERNAL_SERVER_ERROR =>
            {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse { detail };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(
            ApiError::SourceMissing("k".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::JobNotFound("j".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::InvalidVideo("v".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::VideoTooShort("v".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::BadPolicy("p".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::UploadSessionInvalid("u".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::internal("boom").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn plan_errors_convert() {
        let err: ApiError = PlanError::VideoTooShort {
            total: 8.0,
            required: 30,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: ApiError = PlanError::BadPolicy("min > max".into()).into();
        assert!(matches!(err, ApiError::BadPolicy(_)));
    }

    #[test]
    fn media_errors_convert() {
        let err: ApiError = reel_media::MediaError::SourceMissing("404".into()).into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: ApiError = reel_media::MediaError::Timeout(30).into();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
