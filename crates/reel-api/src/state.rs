//! Application state.

use std::sync::Arc;

use reel_jobstore::JobStore;
use reel_queue::{JobQueue, ProgressChannel};
use reel_storage::S3Client;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<S3Client>,
    pub jobstore: Arc<JobStore>,
    pub queue: Arc<JobQueue>,
    pub progress: Arc<ProgressChannel>,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let storage = S3Client::from_env()?;
        let jobstore = JobStore::from_env()?;
        let queue = JobQueue::from_env()?;
        let progress = ProgressChannel::from_env()?;

        Ok(Self {
            config,
            storage: Arc::new(storage),
            jobstore: Arc::new(jobstore),
            queue: Arc::new(queue),
            progress: Arc::new(progress),
        })
    }
}
