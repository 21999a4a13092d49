//! Durable job-record store.
//!
//! One DynamoDB item per job, keyed by `job_id`. The upload coordinator
//! creates records; the owning worker is the only mutator afterwards.
//! Claims and terminal transitions use conditional writes so a duplicate
//! claim surfaces as a conflict instead of silent double-processing.

pub mod client;
pub mod error;
pub mod record;
pub mod retry;

pub use client::{JobStore, JobStoreConfig};
pub use error::{JobStoreError, JobStoreResult};
pub use retry::{with_retry, RetryConfig};
