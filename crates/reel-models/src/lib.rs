//! Shared data models for the Reelsplit backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job records and the job status state machine
//! - Processing stages and canonical progress anchors
//! - Cutting policies and the pure segment planner
//! - Text overlay strategies
//! - Redis pub/sub progress message schema

pub mod cutting;
pub mod job;
pub mod plan;
pub mod progress;
pub mod stage;
pub mod text;

pub use cutting::CuttingOptions;
pub use job::{JobId, JobRecord, JobStatus, UploadMetadata};
pub use plan::{
    plan_segments, plan_segments_with, seed_for_job, PlanError, PlanResult, SegmentPlan,
    SegmentWindow,
};
pub use progress::ProgressUpdate;
pub use stage::{segment_progress, ProcessingStage};
pub use text::{TextInput, TextStrategy, DEFAULT_OVERLAY_TEXT};
