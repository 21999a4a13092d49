//! Segment processor abstraction.
//!
//! Two variants exist: a local FFmpeg child process working on scratch
//! files, and a remote processor invoked synchronously with blob keys.
//! The worker holds `Arc<dyn SegmentProcessor>` and never branches on
//! variant.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::overlay::{build_drawtext_filter, OverlayConfig};
use crate::probe::VideoInfo;

/// Encoding and timeout settings for segment processing.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Encoding preset
    pub preset: String,
    /// Constant rate factor
    pub crf: u8,
    /// Per-segment timeout
    pub segment_timeout: Duration,
    /// Overlay layout
    pub overlay: OverlayConfig,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            preset: "medium".to_string(),
            crf: 23,
            segment_timeout: Duration::from_secs(300),
            overlay: OverlayConfig::default(),
        }
    }
}

impl ProcessorConfig {
    /// Settings for resource-constrained deployments: faster preset, lower
    /// quality, tighter timeout, smaller text.
    pub fn constrained() -> Self {
        Self {
            preset: "ultrafast".to_string(),
            crf: 28,
            segment_timeout: Duration::from_secs(180),
            overlay: OverlayConfig::constrained(),
        }
    }
}

/// One segment to render.
#[derive(Debug, Clone)]
pub struct SegmentRequest {
    /// Blob key of the source video
    pub source_key: String,
    /// Destination blob key for the rendered segment
    pub output_key: String,
    /// Local scratch copy of the source (local variant)
    pub local_input: PathBuf,
    /// Where the local variant writes its output
    pub local_output: PathBuf,
    /// Window start, seconds
    pub start: f64,
    /// Window end, seconds
    pub end: f64,
    /// Overlay text (pre-resolution, unescaped)
    pub overlay_text: String,
    /// Probed source metadata
    pub video_info: VideoInfo,
}

/// Where the rendered segment ended up.
#[derive(Debug, Clone)]
pub enum SegmentArtifact {
    /// Rendered to a scratch file; the caller uploads it
    LocalFile(PathBuf),
    /// Already durable at the output key (remote variant)
    Stored { key: String },
}

/// Abstract segment-rendering capability.
#[async_trait]
pub trait SegmentProcessor: Send + Sync {
    /// Cut one window out of the source and burn the overlay into it.
    async fn process_segment(&self, request: &SegmentRequest) -> MediaResult<SegmentArtifact>;
}

/// Local FFmpeg segment processor.
pub struct LocalSegmentProcessor {
    config: ProcessorConfig,
}

impl LocalSegmentProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SegmentProcessor for LocalSegmentProcessor {
    async fn process_segment(&self, request: &SegmentRequest) -> MediaResult<SegmentArtifact> {
        let duration = request.end - request.start;
        let filter =
            build_drawtext_filter(&self.config.overlay, &request.overlay_text, &request.video_info);

        debug!(
            start = request.start,
            end = request.end,
            "Rendering segment with FFmpeg"
        );

        let cmd = FfmpegCommand::new(&request.local_input, &request.local_output)
            .seek(request.start)
            .duration(duration)
            .video_filter(filter)
            .video_codec("libx264")
            .audio_codec("aac")
            .preset(self.config.preset.as_str())
            .crf(self.config.crf);

        FfmpegRunner::new()
            .with_timeout(self.config.segment_timeout.as_secs())
            .run(&cmd)
            .await?;

        // FFmpeg can exit zero and still leave a husk behind.
        let size = tokio::fs::metadata(&request.local_output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size < 1000 {
            return Err(MediaError::EmptyOutput(request.local_output.clone()));
        }

        info!(
            output = %request.local_output.display(),
            bytes = size,
            "Segment rendered"
        );
        Ok(SegmentArtifact::LocalFile(request.local_output.clone()))
    }
}

/// Configuration for the remote segment processor.
#[derive(Debug, Clone)]
pub struct RemoteProcessorConfig {
    /// Endpoint accepting segment render requests
    pub endpoint: String,
    /// Request timeout
    pub request_timeout: Duration,
}

impl RemoteProcessorConfig {
    /// Create config from environment variables.
    pub fn from_env() -> MediaResult<Self> {
        let endpoint = std::env::var("REMOTE_PROCESSOR_URL").map_err(|_| {
            MediaError::RemoteProcessor("REMOTE_PROCESSOR_URL not set".to_string())
        })?;
        Ok(Self {
            endpoint,
            request_timeout: Duration::from_secs(
                std::env::var("REMOTE_PROCESSOR_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
        })
    }
}

#[derive(Debug, Serialize)]
struct RemoteSegmentRequest<'a> {
    source_key: &'a str,
    output_key: &'a str,
    start_time: f64,
    end_time: f64,
    text_overlay: &'a str,
}

#[derive(Debug, Deserialize)]
struct RemoteSegmentResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

/// Remote segment processor, invoked as a synchronous request with blob
/// keys. Used for high-memory jobs offloaded to a cloud-hosted processor.
pub struct RemoteSegmentProcessor {
    config: RemoteProcessorConfig,
    client: reqwest::Client,
}

impl RemoteSegmentProcessor {
    pub fn new(config: RemoteProcessorConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SegmentProcessor for RemoteSegmentProcessor {
    async fn process_segment(&self, request: &SegmentRequest) -> MediaResult<SegmentArtifact> {
        let payload = RemoteSegmentRequest {
            source_key: &request.source_key,
            output_key: &request.output_key,
            start_time: request.start,
            end_time: request.end,
            text_overlay: &request.overlay_text,
        };

        debug!(endpoint = %self.config.endpoint, "Dispatching segment to remote processor");

        let response = self
            .client
            .post(&self.config.endpoint)
            .timeout(self.config.request_timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| MediaError::RemoteProcessor(e.to_string()))?;

        if !response.status().is_success() {
            return Err(MediaError::RemoteProcessor(format!(
                "remote processor returned {}",
                response.status()
            )));
        }

        let body: RemoteSegmentResponse = response
            .json()
            .await
            .map_err(|e| MediaError::RemoteProcessor(format!("bad response body: {}", e)))?;

        if body.status != "ok" {
            return Err(MediaError::RemoteProcessor(
                body.message.unwrap_or_else(|| "unknown remote failure".to_string()),
            ));
        }

        Ok(SegmentArtifact::Stored {
            key: request.output_key.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_standard_deployment() {
        let config = ProcessorConfig::default();
        assert_eq!(config.preset, "medium");
        assert_eq!(config.crf, 23);
        assert_eq!(config.segment_timeout, Duration::from_secs(300));
    }

    #[test]
    fn constrained_config_tightens_everything() {
        let config = ProcessorConfig::constrained();
        assert_eq!(config.preset, "ultrafast");
        assert_eq!(config.crf, 28);
        assert_eq!(config.segment_timeout, Duration::from_secs(180));
        assert_eq!(config.overlay.font_size_divisor, 20);
    }
}
