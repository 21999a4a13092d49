//! Injected capabilities for job processing.

use std::sync::Arc;

use reel_jobstore::JobStore;
use reel_media::{
    LocalSegmentProcessor, ProcessorConfig, RemoteProcessorConfig, RemoteSegmentProcessor,
    SegmentProcessor,
};
use reel_queue::ProgressChannel;
use reel_storage::S3Client;
use reel_textgen::{GeminiGenerator, TextVariationGenerator};

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Everything a job needs, injected once at executor startup. Test doubles
/// replace the trait objects wholesale.
#[derive(Clone)]
pub struct ProcessingContext {
    pub storage: Arc<S3Client>,
    pub jobstore: Arc<JobStore>,
    pub progress: Arc<ProgressChannel>,
    pub processor: Arc<dyn SegmentProcessor>,
    pub generator: Arc<dyn TextVariationGenerator>,
    pub config: WorkerConfig,
}

impl ProcessingContext {
    /// Build the production context from the environment.
    pub fn from_env(config: WorkerConfig) -> WorkerResult<Self> {
        let processor_config = if config.constrained {
            ProcessorConfig::constrained()
        } else {
            ProcessorConfig::default()
        };

        let processor: Arc<dyn SegmentProcessor> = if config.remote_processor {
            Arc::new(RemoteSegmentProcessor::new(RemoteProcessorConfig::from_env()?))
        } else {
            Arc::new(LocalSegmentProcessor::new(processor_config))
        };

        Ok(Self {
            storage: Arc::new(S3Client::from_env()?),
            jobstore: Arc::new(JobStore::from_env()?),
            progress: Arc::new(ProgressChannel::from_env()?),
            processor,
            generator: Arc::new(GeminiGenerator::from_env()?),
            config,
        })
    }
}
