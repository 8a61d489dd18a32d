//! # FFmpeg Integration
//!
//! Decodifica di un singolo frame video e analisi dei container non ISO BMFF
//! tramite i tool esterni `ffmpeg` e `ffprobe`.
//!
//! ## Responsabilità:
//! - `FfmpegFrameExtractor`: estrae un frame PNG su stdout e lo decodifica con `image`
//! - `probe_video_info()`: durata e dimensioni via `ffprobe -print_format json`
//! - Timeout per ogni invocazione, processo terminato se il chiamante viene cancellato
//!
//! ## Comando di estrazione:
//! ```text
//! ffmpeg -v error -ss <t> -i <input> -frames:v 1 -f image2pipe -vcodec png -
//! ```

use super::PixelSize;
use crate::error::{MediaError, MediaResult};
use crate::platform::PlatformCommands;
use crate::utils::to_string_vec;
use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Decodes one representative frame of a video file
#[async_trait]
pub trait FrameExtractor: Send + Sync {
    /// Decode the frame shown at `at_secs`
    async fn extract_frame(&self, path: &Path, at_secs: f64) -> MediaResult<DynamicImage>;
}

/// Frame extractor backed by the `ffmpeg` binary
pub struct FfmpegFrameExtractor {
    platform: PlatformCommands,
    timeout: Duration,
}

impl FfmpegFrameExtractor {
    pub fn new(platform: PlatformCommands, timeout: Duration) -> Self {
        Self { platform, timeout }
    }
}

/// Run a prepared command with a timeout and fail on a non-zero exit status
async fn run_tool(mut cmd: Command, tool: &str, timeout: Duration) -> MediaResult<Output> {
    cmd.kill_on_drop(true);

    let start_time = std::time::Instant::now();
    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| MediaError::FFmpeg(format!("{} timed out after {}s", tool, timeout.as_secs())))?
        .map_err(|e| MediaError::FFmpeg(format!("failed to execute {}: {}", tool, e)))?;

    debug!("{} finished in {:.2}s", tool, start_time.elapsed().as_secs_f64());

    if !output.status.success() {
        return Err(MediaError::FFmpeg(String::from_utf8_lossy(&output.stderr).trim().to_string()));
    }

    Ok(output)
}

#[async_trait]
impl FrameExtractor for FfmpegFrameExtractor {
    async fn extract_frame(&self, path: &Path, at_secs: f64) -> MediaResult<DynamicImage> {
        let ffmpeg = self.platform.command("ffmpeg")?;
        debug!("🎬 Extracting frame at {:.3}s from {}", at_secs, path.display());

        let mut cmd = Command::new(ffmpeg);
        cmd.args(to_string_vec(["-v", "error", "-ss", &format!("{:.3}", at_secs), "-i"]))
            .arg(path)
            .args(to_string_vec(["-frames:v", "1", "-an", "-f", "image2pipe", "-vcodec", "png", "-"]));

        let output = run_tool(cmd, "ffmpeg", self.timeout).await?;
        if output.stdout.is_empty() {
            return Err(MediaError::FFmpeg(format!("no frame decoded at {:.3}s", at_secs)));
        }

        let frame = tokio::task::spawn_blocking(move || {
            image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
        })
        .await??;

        Ok(frame)
    }
}

/// Video properties reported by ffprobe
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub duration: Option<f64>,
    pub size: Option<PixelSize>,
    pub codec: Option<String>,
}

/// Get video information using ffprobe
pub async fn probe_video_info(
    platform: &PlatformCommands,
    path: &Path,
    timeout: Duration,
) -> MediaResult<VideoInfo> {
    let ffprobe = platform.command("ffprobe")?;

    let mut cmd = Command::new(ffprobe);
    cmd.args(to_string_vec(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"]))
        .arg(path);

    let output = run_tool(cmd, "ffprobe", timeout).await?;
    let info: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| MediaError::FFmpeg(format!("unreadable ffprobe output: {}", e)))?;

    Ok(parse_ffprobe_json(&info))
}

fn parse_ffprobe_json(info: &serde_json::Value) -> VideoInfo {
    let duration = info["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);

    let video_stream = info["streams"]
        .as_array()
        .and_then(|streams| streams.iter().find(|s| s["codec_type"] == "video"));

    let size = video_stream.and_then(|stream| {
        let width = stream["width"].as_u64()?;
        let height = stream["height"].as_u64()?;
        Some(PixelSize::new(u32::try_from(width).ok()?, u32::try_from(height).ok()?))
    });

    let codec = video_stream
        .and_then(|stream| stream["codec_name"].as_str())
        .map(str::to_string);

    VideoInfo { duration, size, codec }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ffprobe_json() {
        let info = json!({
            "format": { "duration": "5.005000", "bit_rate": "800000" },
            "streams": [
                { "codec_type": "audio", "codec_name": "aac" },
                { "codec_type": "video", "codec_name": "vp9", "width": 640, "height": 480 }
            ]
        });

        let parsed = parse_ffprobe_json(&info);
        assert!((parsed.duration.unwrap() - 5.005).abs() < 1e-9);
        assert_eq!(parsed.size, Some(PixelSize::new(640, 480)));
        assert_eq!(parsed.codec.as_deref(), Some("vp9"));
    }

    #[test]
    fn test_parse_ffprobe_json_without_video_stream() {
        let info = json!({
            "format": { "duration": "N/A" },
            "streams": [{ "codec_type": "audio", "codec_name": "opus" }]
        });

        let parsed = parse_ffprobe_json(&info);
        assert_eq!(parsed, VideoInfo { duration: None, size: None, codec: None });
    }

    #[tokio::test]
    async fn test_extract_frame_without_ffmpeg() {
        let empty = tempfile::TempDir::new().unwrap();
        let platform = PlatformCommands::new(Some(empty.path()));
        if platform.is_command_available("ffmpeg") {
            // Real ffmpeg installed; the missing-dependency path cannot be exercised here
            return;
        }

        let extractor = FfmpegFrameExtractor::new(platform, Duration::from_secs(5));
        let err = extractor
            .extract_frame(Path::new("missing.mp4"), 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::MissingDependency(_) | MediaError::UnsupportedPlatform));
    }
}
