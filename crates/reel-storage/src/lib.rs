//! S3 object-store gateway.
//!
//! This crate provides:
//! - Blob upload/download and short-lived presigned URLs
//! - Multi-part upload session operations for the upload coordinator
//! - Object key conventions for sources and processed segments
//! - Adaptive chunk sizing for direct client transfers

pub mod client;
pub mod error;
pub mod keys;
pub mod multipart;

pub use client::{S3Client, S3Config, DEFAULT_PRESIGN_EXPIRY};
pub use error::{StorageError, StorageResult};
pub use keys::{output_key, sanitize_filename, source_key};
pub use multipart::{chunk_plan, ChunkPlan, CompletedPartSpec};
