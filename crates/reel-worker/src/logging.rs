//! Structured job logging.

use reel_models::JobId;
use tracing::{error, info, warn};

/// Job logger stamping the job id on every lifecycle log line.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
}

impl JobLogger {
    /// Create a new job logger.
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
        }
    }

    /// Log the start of a job.
    pub fn start(&self, message: &str) {
        info!(job_id = %self.job_id, "Job started: {}", message);
    }

    /// Log a progress step.
    pub fn progress(&self, message: &str) {
        info!(job_id = %self.job_id, "Job progress: {}", message);
    }

    /// Log a warning.
    pub fn warning(&self, message: &str) {
        warn!(job_id = %self.job_id, "Job warning: {}", message);
    }

    /// Log an error.
    pub fn error(&self, message: &str) {
        error!(job_id = %self.job_id, "Job error: {}", message);
    }

    /// Log completion.
    pub fn completion(&self, message: &str) {
        info!(job_id = %self.job_id, "Job completed: {}", message);
    }
}
