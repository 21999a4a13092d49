//! Job store error types.

use thiserror::Error;

pub type JobStoreResult<T> = Result<T, JobStoreError>;

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("Failed to configure job store: {0}")]
    ConfigError(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Conditional write conflict: {0}")]
    Conflict(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl JobStoreError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound(job_id.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Transport failures are retryable; conflicts and missing items are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, JobStoreError::RequestFailed(_))
    }
}
