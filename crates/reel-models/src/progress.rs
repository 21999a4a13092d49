//! Progress message schema published to the per-job channel.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::job::JobId;
use crate::stage::{segment_progress, ProcessingStage};

/// One progress event, serialized as a single pub/sub message.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProgressUpdate {
    /// Job ID
    pub job_id: JobId,

    /// Stage tag
    pub stage: ProcessingStage,

    /// Human-readable message
    pub message: String,

    /// Segment counter (per-segment events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_segment: Option<u32>,

    /// Total planned segments (per-segment events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_segments: Option<u32>,

    /// Progress percentage in [0, 100]
    pub progress_percentage: f32,

    /// Event timestamp (UTC)
    pub timestamp: DateTime<Utc>,

    /// Output keys uploaded so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_keys: Option<Vec<String>>,

    /// Error message (failed events only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl ProgressUpdate {
    /// Event at a stage's canonical anchor percentage.
    pub fn stage(job_id: JobId, stage: ProcessingStage, message: impl Into<String>) -> Self {
        Self {
            job_id,
            stage,
            message: message.into(),
            current_segment: None,
            total_segments: None,
            progress_percentage: stage.anchor_percent(),
            timestamp: Utc::now(),
            output_keys: None,
            error_message: None,
        }
    }

    /// Per-segment event with interpolated percentage.
    pub fn segment(
        job_id: JobId,
        message: impl Into<String>,
        current: u32,
        total: u32,
    ) -> Self {
        Self {
            job_id,
            stage: ProcessingStage::ProcessingSegment,
            message: message.into(),
            current_segment: Some(current),
            total_segments: Some(total),
            progress_percentage: segment_progress(current, total),
            timestamp: Utc::now(),
            output_keys: None,
            error_message: None,
        }
    }

    /// Terminal failure event.
    pub fn failed(job_id: JobId, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            job_id,
            stage: ProcessingStage::Failed,
            message: format!("Processing failed: {}", error),
            current_segment: None,
            total_segments: None,
            progress_percentage: ProcessingStage::Failed.anchor_percent(),
            timestamp: Utc::now(),
            output_keys: None,
            error_message: Some(error),
        }
    }

    /// Attach the output keys uploaded so far.
    pub fn with_output_keys(mut self, keys: Vec<String>) -> Self {
        self.output_keys = Some(keys);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_event_uses_anchor() {
        let event = ProgressUpdate::stage(
            JobId::from_string("j1"),
            ProcessingStage::Probing,
            "Analyzing video duration...",
        );
        assert_eq!(event.progress_percentage, 5.0);
        assert!(event.current_segment.is_none());
    }

    #[test]
    fn segment_event_carries_counters() {
        let event = ProgressUpdate::segment(JobId::from_string("j1"), "Segment 2/4", 2, 4);
        assert_eq!(event.current_segment, Some(2));
        assert_eq!(event.total_segments, Some(4));
        assert_eq!(event.progress_percentage, 50.0);
    }

    #[test]
    fn failed_event_carries_error() {
        let event = ProgressUpdate::failed(JobId::from_string("j1"), "boom");
        assert_eq!(event.stage, ProcessingStage::Failed);
        assert_eq!(event.progress_percentage, 0.0);
        assert_eq!(event.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn serializes_stage_tag() {
        let event = ProgressUpdate::stage(
            JobId::from_string("j1"),
            ProcessingStage::GeneratingText,
            "AI generating text variations...",
        );
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"stage\":\"generating_text\""));
        assert!(!json.contains("current_segment"));
    }
}
