//! # Media Probe Module
//!
//! Questo modulo ricava dimensioni, durata e thumbnail dai file già risolti
//! in una posizione locale.
//!
//! ## Architettura:
//! - `mp4`: parser nativo del box `moov` per i container ISO BMFF
//! - `ffmpeg`: estrazione dei frame e fallback `ffprobe` per gli altri container
//! - `image_probe`: lettura header, ridimensionamento e codifica JPEG
//!
//! ## Politica thumbnail video:
//! - Frame a `thumbnail_offset_secs` (default 1s), oppure l'ultimo disponibile se il video è più corto
//! - Lato lungo limitato a `thumbnail_max_dimension`, JPEG a `thumbnail_quality`
//! - Nessuna traccia video o container illeggibile: `None`, mai un errore

pub mod ffmpeg;
pub mod image_probe;
pub mod mp4;

pub use ffmpeg::{FfmpegFrameExtractor, FrameExtractor};

use crate::config::Config;
use crate::error::{MediaError, MediaResult};
use crate::file_manager::FileManager;
use crate::platform::PlatformCommands;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Distance kept from the end of a short video when picking its thumbnail frame
const END_MARGIN_SECS: f64 = 0.1;

/// Native pixel dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Container level properties of a video file
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct VideoMetadata {
    pub duration: Option<f64>,
    /// Natural size of the first video track; `None` when there is no video track
    pub size: Option<PixelSize>,
}

/// Derives sizes, durations and thumbnails from local files
#[derive(Clone)]
pub struct MediaProbe {
    config: Arc<Config>,
    platform: PlatformCommands,
    extractor: Arc<dyn FrameExtractor>,
}

impl fmt::Debug for MediaProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaProbe")
            .field("config", &self.config)
            .field("platform", &self.platform)
            .finish_non_exhaustive()
    }
}

impl MediaProbe {
    /// Probe decoding frames with `ffmpeg`
    pub fn new(config: Config) -> Self {
        let platform = PlatformCommands::new(config.tools_dir.as_deref());
        let extractor = Arc::new(FfmpegFrameExtractor::new(platform.clone(), config.probe_timeout()));
        Self {
            config: Arc::new(config),
            platform,
            extractor,
        }
    }

    /// Probe decoding frames with a host supplied extractor
    pub fn with_frame_extractor(config: Config, extractor: Arc<dyn FrameExtractor>) -> Self {
        let platform = PlatformCommands::new(config.tools_dir.as_deref());
        Self {
            config: Arc::new(config),
            platform,
            extractor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn platform(&self) -> &PlatformCommands {
        &self.platform
    }

    /// Native pixel size of an image file
    pub async fn image_size(&self, path: &Path) -> MediaResult<PixelSize> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || image_probe::size_from_path(&path)).await?
    }

    /// Native pixel size of an encoded image held in memory
    pub async fn image_size_from_bytes(&self, data: Bytes) -> MediaResult<PixelSize> {
        tokio::task::spawn_blocking(move || image_probe::size_from_bytes(&data)).await?
    }

    /// Duration and natural size, parsed natively for ISO BMFF and via ffprobe otherwise
    pub async fn video_metadata(&self, path: &Path) -> MediaResult<VideoMetadata> {
        if mp4::is_iso_bmff(path) {
            let owned = path.to_path_buf();
            let parsed = tokio::task::spawn_blocking(move || mp4::read_metadata(&owned))
                .await
                .map_err(MediaError::from)
                .and_then(|result| result);
            match parsed {
                Ok(metadata) => {
                    let size = metadata.first_video_track().map(|track| {
                        PixelSize::new(track.width.round() as u32, track.height.round() as u32)
                    });
                    return Ok(VideoMetadata {
                        duration: metadata.duration(),
                        size,
                    });
                }
                Err(e) => {
                    debug!("Native container parse failed for {}: {}, trying ffprobe", path.display(), e);
                }
            }
        }

        let info = ffmpeg::probe_video_info(&self.platform, path, self.config.probe_timeout()).await?;
        Ok(VideoMetadata {
            duration: info.duration,
            size: info.size,
        })
    }

    pub async fn video_duration(&self, path: &Path) -> MediaResult<Option<f64>> {
        Ok(self.video_metadata(path).await?.duration)
    }

    pub async fn video_size(&self, path: &Path) -> MediaResult<Option<PixelSize>> {
        Ok(self.video_metadata(path).await?.size)
    }

    /// Timestamp of the thumbnail frame for a video of the given duration
    pub fn thumbnail_time(&self, duration: Option<f64>) -> f64 {
        let offset = self.config.thumbnail_offset_secs;
        match duration {
            Some(duration) => offset.min((duration - END_MARGIN_SECS).max(0.0)),
            None => offset,
        }
    }

    /// JPEG encoded thumbnail of a video file.
    ///
    /// Returns `None` when no thumbnail can be produced; the cause is logged.
    pub async fn video_thumbnail_data(&self, path: &Path) -> Option<Bytes> {
        let metadata = match self.video_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("⚠️  Cannot read container of {}: {}", path.display(), e);
                return None;
            }
        };

        if metadata.size.is_none() {
            warn!("⚠️  No video track in {}", path.display());
            return None;
        }

        let at_secs = self.thumbnail_time(metadata.duration);
        let frame = match self.extractor.extract_frame(path, at_secs).await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("⚠️  Frame extraction failed for {}: {}", path.display(), e);
                return None;
            }
        };

        let max_dimension = self.config.thumbnail_max_dimension;
        let quality = self.config.thumbnail_quality;
        let encoded = tokio::task::spawn_blocking(move || {
            image_probe::encode_jpeg(&image_probe::downscale(frame, max_dimension), quality)
        })
        .await;

        match encoded {
            Ok(Ok(jpeg)) => {
                debug!("Thumbnail for {}: {} bytes", path.display(), jpeg.len());
                Some(Bytes::from(jpeg))
            }
            Ok(Err(e)) => {
                warn!("⚠️  Thumbnail encoding failed for {}: {}", path.display(), e);
                None
            }
            Err(e) => {
                warn!("⚠️  Thumbnail task failed for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Write encoded thumbnail bytes to a new `.jpg` temp file
    pub async fn store_thumbnail(&self, data: Bytes) -> MediaResult<PathBuf> {
        FileManager::store_to_temp_dir(&self.config.temp_dir(), data, "jpg").await
    }

    /// Re-encode a picked photo as JPEG into a new `.jpg` temp file
    pub async fn transcode_photo(&self, data: Bytes) -> MediaResult<PathBuf> {
        let quality = self.config.photo_quality;
        let jpeg = tokio::task::spawn_blocking(move || image_probe::transcode_to_jpeg(&data, quality)).await??;
        FileManager::store_to_temp_dir(&self.config.temp_dir(), Bytes::from(jpeg), "jpg").await
    }

    /// Copy a file into a new temp file with the same extension
    pub async fn copy_to_temp(&self, source: &Path) -> MediaResult<PathBuf> {
        FileManager::copy_to_temp_dir(&self.config.temp_dir(), source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{audio_only_mp4_bytes, jpeg_bytes, write_mp4, StubFrameExtractor};
    use tempfile::TempDir;

    fn probe_in(dir: &TempDir, extractor: Arc<StubFrameExtractor>) -> MediaProbe {
        let config = Config {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        MediaProbe::with_frame_extractor(config, extractor)
    }

    #[test]
    fn test_thumbnail_time() {
        let dir = TempDir::new().unwrap();
        let probe = probe_in(&dir, StubFrameExtractor::new(1, 1));

        assert_eq!(probe.thumbnail_time(Some(5.0)), 1.0);
        assert_eq!(probe.thumbnail_time(None), 1.0);
        assert!((probe.thumbnail_time(Some(0.5)) - 0.4).abs() < 1e-9);
        assert_eq!(probe.thumbnail_time(Some(0.05)), 0.0);
    }

    #[tokio::test]
    async fn test_video_metadata_from_mp4() {
        let dir = TempDir::new().unwrap();
        let probe = probe_in(&dir, StubFrameExtractor::new(1, 1));
        let path = write_mp4(dir.path(), "clip.mp4", 640, 480, 5.0);

        let metadata = probe.video_metadata(&path).await.unwrap();
        assert!((metadata.duration.unwrap() - 5.0).abs() < 1e-6);
        assert_eq!(metadata.size, Some(PixelSize::new(640, 480)));
    }

    #[tokio::test]
    async fn test_video_thumbnail_is_downscaled_jpeg() {
        let dir = TempDir::new().unwrap();
        let extractor = StubFrameExtractor::new(640, 480);
        let probe = probe_in(&dir, extractor.clone());
        let path = write_mp4(dir.path(), "clip.mp4", 640, 480, 5.0);

        let thumbnail = probe.video_thumbnail_data(&path).await.unwrap();
        assert_eq!(&thumbnail[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image_probe::size_from_bytes(&thumbnail).unwrap(),
            PixelSize::new(300, 225)
        );
        assert_eq!(extractor.calls(), 1);
        assert_eq!(*extractor.last_offset.lock(), Some(1.0));
    }

    #[tokio::test]
    async fn test_video_thumbnail_absent_without_video_track() {
        let dir = TempDir::new().unwrap();
        let extractor = StubFrameExtractor::new(8, 8);
        let probe = probe_in(&dir, extractor.clone());
        let path = dir.path().join("voice.m4v");
        std::fs::write(&path, audio_only_mp4_bytes(3.0)).unwrap();

        assert!(probe.video_thumbnail_data(&path).await.is_none());
        assert_eq!(extractor.calls(), 0);
    }

    #[tokio::test]
    async fn test_video_thumbnail_absent_when_decoder_fails() {
        let dir = TempDir::new().unwrap();
        let probe = probe_in(&dir, StubFrameExtractor::failing());
        let path = write_mp4(dir.path(), "clip.mp4", 64, 48, 2.0);

        assert!(probe.video_thumbnail_data(&path).await.is_none());
    }

    #[tokio::test]
    async fn test_video_thumbnail_absent_for_garbage() {
        let dir = TempDir::new().unwrap();
        let probe = probe_in(&dir, StubFrameExtractor::new(8, 8));
        let path = dir.path().join("broken.mp4");
        std::fs::write(&path, b"definitely not a movie").unwrap();

        assert!(probe.video_thumbnail_data(&path).await.is_none());
    }

    #[tokio::test]
    async fn test_transcode_photo_writes_jpg() {
        let dir = TempDir::new().unwrap();
        let probe = probe_in(&dir, StubFrameExtractor::new(1, 1));
        let png = Bytes::from(crate::test_support::png_bytes(12, 7));

        let path = probe.transcode_photo(png).await.unwrap();
        assert_eq!(path.extension().unwrap(), "jpg");
        assert!(path.starts_with(dir.path()));
        assert_eq!(probe.image_size(&path).await.unwrap(), PixelSize::new(12, 7));
    }

    #[tokio::test]
    async fn test_image_size_from_bytes() {
        let dir = TempDir::new().unwrap();
        let probe = probe_in(&dir, StubFrameExtractor::new(1, 1));
        let size = probe.image_size_from_bytes(Bytes::from(jpeg_bytes(10, 10))).await.unwrap();
        assert_eq!(size, PixelSize::new(10, 10));
    }
}
