//! Processing stages and canonical progress anchors.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Processing stage of a job.
///
/// Each stage has a canonical progress anchor; the per-segment stage
/// interpolates between 10% and 90% via [`segment_progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStage {
    /// Waiting in the queue
    #[default]
    Queued,
    /// Worker is fetching the source blob
    Downloading,
    /// Probing source metadata
    Probing,
    /// Resolving overlay texts (may call the language model)
    GeneratingText,
    /// Cutting and overlaying one segment
    ProcessingSegment,
    /// Finalizing uploads
    UploadingResults,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl ProcessingStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStage::Queued => "queued",
            ProcessingStage::Downloading => "downloading",
            ProcessingStage::Probing => "probing",
            ProcessingStage::GeneratingText => "generating_text",
            ProcessingStage::ProcessingSegment => "processing_segment",
            ProcessingStage::UploadingResults => "uploading_results",
            ProcessingStage::Completed => "completed",
            ProcessingStage::Failed => "failed",
        }
    }

    /// Canonical progress anchor for the stage.
    ///
    /// The per-segment stage anchors at 10% and advances via
    /// [`segment_progress`]; `failed` anchors at 0 regardless of how far the
    /// job got.
    pub fn anchor_percent(&self) -> f32 {
        match self {
            ProcessingStage::Queued => 0.0,
            ProcessingStage::Downloading => 2.0,
            ProcessingStage::Probing => 5.0,
            ProcessingStage::GeneratingText => 10.0,
            ProcessingStage::ProcessingSegment => 10.0,
            ProcessingStage::UploadingResults => 95.0,
            ProcessingStage::Completed => 100.0,
            ProcessingStage::Failed => 0.0,
        }
    }

    /// Check if this is a terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProcessingStage::Completed | ProcessingStage::Failed)
    }

    /// Parse a stored stage tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(ProcessingStage::Queued),
            "downloading" => Some(ProcessingStage::Downloading),
            "probing" => Some(ProcessingStage::Probing),
            "generating_text" => Some(ProcessingStage::GeneratingText),
            "processing_segment" => Some(ProcessingStage::ProcessingSegment),
            "uploading_results" => Some(ProcessingStage::UploadingResults),
            "completed" => Some(ProcessingStage::Completed),
            "failed" => Some(ProcessingStage::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress percentage after `completed` of `total` segments: 10 + (i/N)*80.
pub fn segment_progress(completed: u32, total: u32) -> f32 {
    if total == 0 {
        return 10.0;
    }
    10.0 + (completed as f32 / total as f32) * 80.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_table() {
        assert_eq!(ProcessingStage::Queued.anchor_percent(), 0.0);
        assert_eq!(ProcessingStage::Downloading.anchor_percent(), 2.0);
        assert_eq!(ProcessingStage::Probing.anchor_percent(), 5.0);
        assert_eq!(ProcessingStage::GeneratingText.anchor_percent(), 10.0);
        assert_eq!(ProcessingStage::UploadingResults.anchor_percent(), 95.0);
        assert_eq!(ProcessingStage::Completed.anchor_percent(), 100.0);
        assert_eq!(ProcessingStage::Failed.anchor_percent(), 0.0);
    }

    #[test]
    fn segment_progress_interpolates_10_to_90() {
        assert_eq!(segment_progress(0, 4), 10.0);
        assert_eq!(segment_progress(1, 4), 30.0);
        assert_eq!(segment_progress(4, 4), 90.0);
        // Zero total is a degenerate case, stays at the anchor.
        assert_eq!(segment_progress(0, 0), 10.0);
    }

    #[test]
    fn segment_progress_is_monotonic() {
        let n = 7;
        let mut last = 0.0;
        for i in 0..=n {
            let p = segment_progress(i, n);
            assert!(p >= last);
            last = p;
        }
        assert!(last <= 95.0);
    }

    #[test]
    fn stage_tags_round_trip() {
        for stage in [
            ProcessingStage::Queued,
            ProcessingStage::Downloading,
            ProcessingStage::Probing,
            ProcessingStage::GeneratingText,
            ProcessingStage::ProcessingSegment,
            ProcessingStage::UploadingResults,
            ProcessingStage::Completed,
            ProcessingStage::Failed,
        ] {
            assert_eq!(ProcessingStage::parse(stage.as_str()), Some(stage));
        }
    }
}
