//! Job record and status state machine.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Job processing status.
///
/// Transitions only along `Queued -> Processing -> (Completed | Failed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Queued,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Check if a transition to `next` is permitted by the state machine.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }

    /// Parse a stored status string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "QUEUED" => Some(JobStatus::Queued),
            "PROCESSING" => Some(JobStatus::Processing),
            "COMPLETED" => Some(JobStatus::Completed),
            "FAILED" => Some(JobStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata declared by the client at upload initiation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UploadMetadata {
    /// Original filename
    pub filename: String,
    /// Declared file size in bytes
    pub file_size: u64,
    /// MIME type of the upload
    pub content_type: String,
    /// Optional display title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Durable record of a processing job.
///
/// Created when an upload finalizes; mutated only by the segment worker
/// afterwards; never destroyed.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    /// Unique job ID
    pub job_id: JobId,

    /// Owning user ID (opaque)
    pub user_id: String,

    /// Object-store key of the source upload
    pub source_key: String,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Current processing stage tag
    #[serde(default)]
    pub stage: crate::stage::ProcessingStage,

    /// Progress percentage (0-100), non-decreasing
    #[serde(default)]
    pub progress: u8,

    /// Probed source duration in seconds, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<f64>,

    /// Object-store keys of the processed segments, in order
    #[serde(default)]
    pub output_keys: Vec<String>,

    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Upload request metadata
    #[serde(default)]
    pub metadata: UploadMetadata,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a new queued job record.
    pub fn new(
        job_id: JobId,
        user_id: impl Into<String>,
        source_key: impl Into<String>,
        metadata: UploadMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            job_id,
            user_id: user_id.into(),
            source_key: source_key.into(),
            status: JobStatus::Queued,
            stage: crate::stage::ProcessingStage::Queued,
            progress: 0,
            video_duration: None,
            output_keys: Vec::new(),
            error_message: None,
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set the probed duration.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.video_duration = Some(duration);
        self
    }

    /// Transition to processing.
    pub fn start(mut self) -> Self {
        self.status = JobStatus::Processing;
        self.stage = crate::stage::ProcessingStage::Downloading;
        self.updated_at = Utc::now();
        self
    }

    /// Mark completed with the final output key list.
    pub fn complete(mut self, output_keys: Vec<String>) -> Self {
        self.status = JobStatus::Completed;
        self.stage = crate::stage::ProcessingStage::Completed;
        self.progress = 100;
        self.output_keys = output_keys;
        self.updated_at = Utc::now();
        self
    }

    /// Mark failed with an error message.
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.status = JobStatus::Failed;
        self.stage = crate::stage::ProcessingStage::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
        self
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> JobRecord {
        JobRecord::new(
            JobId::new(),
            "user-1",
            "uploads/abc/20250101_000000_clip.mp4",
            UploadMetadata {
                filename: "clip.mp4".into(),
                file_size: 1024,
                content_type: "video/mp4".into(),
                title: None,
            },
        )
    }

    #[test]
    fn new_record_is_queued() {
        let job = record();
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.progress, 0);
        assert!(job.output_keys.is_empty());
        assert!(!job.is_terminal());
    }

    #[test]
    fn status_transitions_follow_state_machine() {
        assert!(JobStatus::Queued.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));

        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Completed));
        assert!(!JobStatus::Queued.can_transition_to(JobStatus::Failed));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Failed.can_transition_to(JobStatus::Processing));
        assert!(!JobStatus::Completed.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn complete_sets_progress_and_outputs() {
        let job = record().start();
        assert_eq!(job.status, JobStatus::Processing);

        let done = job.complete(vec!["processed/j/segment_001.mp4".into()]);
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.progress, 100);
        assert_eq!(done.output_keys.len(), 1);
        assert!(done.is_terminal());
    }

    #[test]
    fn fail_records_error() {
        let job = record().start().fail("probe failed");
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("probe failed"));
        assert!(job.is_terminal());
    }

    #[test]
    fn status_serializes_upper_snake() {
        assert_eq!(
            serde_json::to_string(&JobStatus::Queued).unwrap(),
            "\"QUEUED\""
        );
        assert_eq!(JobStatus::parse("PROCESSING"), Some(JobStatus::Processing));
        assert_eq!(JobStatus::parse("bogus"), None);
    }
}
