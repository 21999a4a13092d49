//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent jobs
    pub max_concurrent_jobs: usize,
    /// Work directory for scratch files
    pub work_dir: String,
    /// Resource-constrained deployment mode (tighter timeouts, faster
    /// encoding, smaller text)
    pub constrained: bool,
    /// Use the remote segment processor instead of local FFmpeg
    pub remote_processor: bool,
    /// Retry attempts for transient failures inside a job
    pub transient_retries: u32,
    /// Base backoff delay for transient retries
    pub retry_base_delay: Duration,
    /// How often the executor scans for orphaned pending jobs
    pub claim_interval: Duration,
    /// Minimum idle time before a pending job can be claimed (crash recovery)
    pub claim_min_idle: Duration,
    /// Graceful shutdown timeout
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            work_dir: "/tmp/reelsplit".to_string(),
            constrained: false,
            remote_processor: false,
            transient_retries: 3,
            retry_base_delay: Duration::from_secs(60),
            claim_interval: Duration::from_secs(60),
            claim_min_idle: Duration::from_secs(1800),
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            max_concurrent_jobs: std::env::var("WORKER_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .unwrap_or_else(|_| "/tmp/reelsplit".to_string()),
            constrained: std::env::var("WORKER_CONSTRAINED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            remote_processor: std::env::var("WORKER_REMOTE_PROCESSOR")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            transient_retries: std::env::var("WORKER_TRANSIENT_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3),
            retry_base_delay: Duration::from_secs(
                std::env::var("WORKER_RETRY_BASE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            claim_interval: Duration::from_secs(
                std::env::var("WORKER_CLAIM_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
            claim_min_idle: Duration::from_secs(
                std::env::var("WORKER_CLAIM_MIN_IDLE_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1800),
            ),
            shutdown_timeout: Duration::from_secs(
                std::env::var("WORKER_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}
