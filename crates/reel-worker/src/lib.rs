//! Segment processing worker.
//!
//! This crate provides:
//! - Job executor: bounded-concurrency consumption with crash recovery
//! - Per-job pipeline: fetch, probe, plan, resolve text, render segments,
//!   upload, emit progress
//! - Scratch directory lifecycle
//! - Graceful shutdown

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod pipeline;
pub mod retry;

pub use config::WorkerConfig;
pub use context::ProcessingContext;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use logging::JobLogger;
