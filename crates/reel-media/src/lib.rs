//! FFmpeg CLI wrapper for the segment worker.
//!
//! This crate provides:
//! - An FFmpeg command builder and runner with timeout handling
//! - FFprobe metadata probing over local files and signed URLs
//! - Drawtext overlay construction (escaping, font sizing, safe-zone
//!   multi-line wrapping)
//! - The `SegmentProcessor` abstraction with local and remote variants

pub mod command;
pub mod error;
pub mod overlay;
pub mod probe;
pub mod processor;

pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use overlay::{build_drawtext_filter, escape_drawtext, OverlayConfig};
pub use probe::{probe_url, probe_video, validate_video, VideoInfo};
pub use processor::{
    LocalSegmentProcessor, ProcessorConfig, RemoteProcessorConfig, RemoteSegmentProcessor,
    SegmentArtifact, SegmentProcessor, SegmentRequest,
};
