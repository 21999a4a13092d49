//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Planner error: {0}")]
    Plan(#[from] reel_models::PlanError),

    #[error("Storage error: {0}")]
    Storage(#[from] reel_storage::StorageError),

    #[error("Job store error: {0}")]
    JobStore(#[from] reel_jobstore::JobStoreError),

    #[error("Media error: {0}")]
    Media(#[from] reel_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] reel_queue::QueueError),

    #[error("Text generation error: {0}")]
    TextGen(#[from] reel_textgen::TextGenError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the job should be redelivered and retried.
    ///
    /// Transient causes (object-store errors, processor exits, timeouts)
    /// retry; an unplannable policy or an unreadable source will fail the
    /// same way every time.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Storage(e) => e.is_retryable(),
            WorkerError::JobStore(e) => e.is_retryable(),
            WorkerError::Media(e) => e.is_transient(),
            WorkerError::Queue(_) | WorkerError::Io(_) => true,
            WorkerError::Plan(_)
            | WorkerError::ConfigError(_)
            | WorkerError::JobFailed(_)
            | WorkerError::TextGen(_) => false,
        }
    }

    /// Whether this is a duplicate-claim conflict, which is harmless: the
    /// other worker owns the job.
    pub fn is_duplicate_claim(&self) -> bool {
        matches!(
            self,
            WorkerError::JobStore(reel_jobstore::JobStoreError::Conflict(_))
        )
    }
}
