//! FFprobe video metadata probing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Probe timeout; signed-URL probes must finish well within URL expiry.
const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Video file information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Duration in seconds
    pub duration: f64,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Frame rate (fps)
    pub fps: f64,
    /// Video codec
    pub codec: String,
}

impl VideoInfo {
    /// Whether the frame is taller than wide.
    pub fn is_vertical(&self) -> bool {
        self.height > self.width
    }
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    duration: Option<String>,
}

/// Probe a local video file.
pub async fn probe_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    probe_target(&path.to_string_lossy()).await
}

/// Probe a video over a signed read URL without downloading it.
///
/// Failure modes are distinguished: a missing blob surfaces as
/// `SourceMissing`, a hung transfer as `Timeout`, and unparseable or
/// zero-duration metadata as `InvalidVideo`.
pub async fn probe_url(url: &str) -> MediaResult<VideoInfo> {
    probe_target(url).await
}

async fn probe_target(target: &str) -> MediaResult<VideoInfo> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    debug!("Probing video metadata");

    let output = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| MediaError::Timeout(PROBE_TIMEOUT.as_secs()))??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if stderr.contains("404") || stderr.contains("No such file") {
            return Err(MediaError::SourceMissing(stderr));
        }
        return Err(MediaError::InvalidVideo(format!(
            "FFprobe could not read the source: {}",
            stderr
        )));
    }

    let probe: FfprobeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaError::InvalidVideo(format!("unparseable metadata: {}", e)))?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or_else(|| MediaError::InvalidVideo("No video stream found".to_string()))?;

    // Container duration first, stream duration as fallback.
    let duration = probe
        .format
        .duration
        .as_ref()
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    if duration <= 0.0 {
        return Err(MediaError::InvalidVideo("zero duration".to_string()));
    }

    let fps = video_stream
        .avg_frame_rate
        .as_ref()
        .or(video_stream.r_frame_rate.as_ref())
        .and_then(|r| parse_frame_rate(r))
        .unwrap_or(30.0);

    Ok(VideoInfo {
        duration,
        width: video_stream.width.unwrap_or(0),
        height: video_stream.height.unwrap_or(0),
        fps,
        codec: video_stream.codec_name.clone().unwrap_or_default(),
    })
}

/// Validate that a local file is a readable video with positive duration.
pub async fn validate_video(path: impl AsRef<Path>) -> MediaResult<VideoInfo> {
    let info = probe_video(path).await?;
    if info.width == 0 || info.height == 0 {
        return Err(MediaError::InvalidVideo("missing frame dimensions".into()));
    }
    Ok(info)
}

/// Parse frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_frame_rates() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }

    #[test]
    fn orientation() {
        let vertical = VideoInfo {
            duration: 10.0,
            width: 1080,
            height: 1920,
            fps: 30.0,
            codec: "h264".into(),
        };
        assert!(vertical.is_vertical());

        let horizontal = VideoInfo {
            width: 1920,
            height: 1080,
            ..vertical
        };
        assert!(!horizontal.is_vertical());
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = probe_video("/nonexistent/video.mp4").await.unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
