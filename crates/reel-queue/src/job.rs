//! Job payload carried on the worker queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use reel_models::{CuttingOptions, JobId, TextInput, UploadMetadata};

/// A queued video-processing job.
///
/// Carries everything the worker needs so it never has to consult the API
/// process: source location, cutting policy, text policy, and the metadata
/// declared at upload time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessVideoJob {
    /// Unique job ID (also the job-record key and the progress channel key)
    pub job_id: JobId,
    /// Owning user ID
    pub user_id: String,
    /// Object-store key of the uploaded source
    pub source_key: String,
    /// Cutting policy
    #[serde(default)]
    pub cutting_options: CuttingOptions,
    /// Text overlay policy
    #[serde(default)]
    pub text_input: TextInput,
    /// Upload request metadata
    #[serde(default)]
    pub metadata: UploadMetadata,
    /// Duration probed at upload finalize, if available (advisory; the
    /// worker re-probes before planning)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_duration: Option<f64>,
    /// When the job was created
    pub created_at: DateTime<Utc>,
}

impl ProcessVideoJob {
    /// Create a new job payload.
    pub fn new(
        job_id: JobId,
        user_id: impl Into<String>,
        source_key: impl Into<String>,
        cutting_options: CuttingOptions,
        text_input: TextInput,
    ) -> Self {
        Self {
            job_id,
            user_id: user_id.into(),
            source_key: source_key.into(),
            cutting_options,
            text_input,
            metadata: UploadMetadata::default(),
            video_duration: None,
            created_at: Utc::now(),
        }
    }

    /// Attach upload metadata.
    pub fn with_metadata(mut self, metadata: UploadMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Attach the duration probed at finalize.
    pub fn with_duration(mut self, duration: Option<f64>) -> Self {
        self.video_duration = duration;
        self
    }

    /// Idempotency key for enqueue deduplication.
    pub fn idempotency_key(&self) -> String {
        format!("process:{}", self.job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips() {
        let job = ProcessVideoJob::new(
            JobId::from_string("j1"),
            "user-1",
            "uploads/j1/20250101_000000_a.mp4",
            CuttingOptions::Fixed {
                duration_seconds: 30,
            },
            TextInput::one_for_all("Hello"),
        )
        .with_duration(Some(95.0));

        let json = serde_json::to_string(&job).unwrap();
        let restored: ProcessVideoJob = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.job_id, job.job_id);
        assert_eq!(restored.video_duration, Some(95.0));
        assert_eq!(restored.idempotency_key(), "process:j1");
    }
}
