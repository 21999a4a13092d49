//! Redis-backed job queue and progress fan-out.
//!
//! This crate provides:
//! - Job enqueueing via Redis Streams (consumer group, ack, DLQ,
//!   pending-claim for crash recovery)
//! - Progress events via Redis Pub/Sub, one channel per job

pub mod error;
pub mod job;
pub mod progress;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::ProcessVideoJob;
pub use progress::ProgressChannel;
pub use queue::{JobQueue, QueueConfig};
