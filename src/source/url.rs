//! Adapter over a bare local file. The URL is the identity; everything else is
//! read from the file on demand and cached.

use super::cell::ResolutionCache;
use crate::error::MediaResult;
use crate::file_manager::{FileManager, MediaType};
use crate::probe::{MediaProbe, PixelSize};
use bytes::Bytes;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

struct UrlInner {
    path: PathBuf,
    media_type: MediaType,
    probe: MediaProbe,
    cache: ResolutionCache,
}

/// Adapter over a local file path
#[derive(Clone)]
pub struct UrlSource {
    inner: Arc<UrlInner>,
}

impl fmt::Debug for UrlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlSource")
            .field("path", &self.inner.path)
            .field("media_type", &self.inner.media_type)
            .finish()
    }
}

impl UrlSource {
    pub fn new(path: impl Into<PathBuf>, probe: MediaProbe) -> Self {
        let path = path.into();
        let media_type = FileManager::classify(&path);
        Self {
            inner: Arc::new(UrlInner {
                path,
                media_type,
                probe,
                cache: ResolutionCache::new(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn media_type(&self) -> Option<MediaType> {
        Some(self.inner.media_type)
    }

    pub async fn url(&self) -> MediaResult<Option<PathBuf>> {
        Ok(Some(self.inner.path.clone()))
    }

    pub async fn data(&self) -> MediaResult<Option<Bytes>> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .cache
            .data
            .get_or_resolve(move || async move {
                Ok(Some(Bytes::from(tokio::fs::read(&inner.path).await?)))
            })
            .await
    }

    pub async fn thumbnail_data(&self) -> MediaResult<Option<Bytes>> {
        match self.inner.media_type {
            MediaType::Image => self.data().await,
            MediaType::Video => {
                let inner = Arc::clone(&self.inner);
                self.inner
                    .cache
                    .thumbnail
                    .get_or_resolve(move || async move {
                        Ok(inner.probe.video_thumbnail_data(&inner.path).await)
                    })
                    .await
            }
            MediaType::File => Ok(None),
        }
    }

    pub async fn thumbnail_url(&self) -> MediaResult<Option<PathBuf>> {
        match self.inner.media_type {
            MediaType::Image | MediaType::File => self.url().await,
            MediaType::Video => match self.thumbnail_data().await? {
                Some(data) => Ok(Some(self.inner.probe.store_thumbnail(data).await?)),
                None => Ok(None),
            },
        }
    }

    pub async fn size(&self) -> MediaResult<Option<PixelSize>> {
        let inner = Arc::clone(&self.inner);
        match self.inner.media_type {
            MediaType::Image => {
                self.inner
                    .cache
                    .size
                    .get_or_resolve(move || async move {
                        Ok(Some(inner.probe.image_size(&inner.path).await?))
                    })
                    .await
            }
            MediaType::Video => {
                self.inner
                    .cache
                    .size
                    .get_or_resolve(move || async move { inner.probe.video_size(&inner.path).await })
                    .await
            }
            MediaType::File => Ok(None),
        }
    }

    pub async fn byte_count(&self) -> MediaResult<Option<u64>> {
        let inner = Arc::clone(&self.inner);
        self.inner
            .cache
            .byte_count
            .get_or_resolve(move || async move { Ok(Some(FileManager::byte_count(&inner.path).await?)) })
            .await
    }

    pub async fn duration(&self) -> MediaResult<Option<f64>> {
        if self.inner.media_type != MediaType::Video {
            return Ok(None);
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .cache
            .duration
            .get_or_resolve(move || async move { inner.probe.video_duration(&inner.path).await })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::MediaError;
    use crate::test_support::{write_jpeg, write_mp4, StubFrameExtractor};
    use tempfile::TempDir;

    fn probe(dir: &TempDir, extractor: Arc<StubFrameExtractor>) -> MediaProbe {
        let config = Config {
            temp_dir: Some(dir.path().to_path_buf()),
            ..Config::default()
        };
        MediaProbe::with_frame_extractor(config, extractor)
    }

    #[tokio::test]
    async fn test_data_is_read_once() {
        let dir = TempDir::new().unwrap();
        let path = write_jpeg(dir.path(), "photo.jpg", 10, 10);
        let source = UrlSource::new(&path, probe(&dir, StubFrameExtractor::new(1, 1)));

        let first = source.data().await.unwrap().unwrap();
        std::fs::write(&path, b"changed on disk").unwrap();
        let second = source.data().await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner.cache.data.attempts(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("later.png");
        let source = UrlSource::new(&path, probe(&dir, StubFrameExtractor::new(1, 1)));

        assert!(matches!(source.data().await, Err(MediaError::Io(_))));
        std::fs::write(&path, b"now present").unwrap();
        assert_eq!(source.data().await.unwrap().unwrap(), Bytes::from_static(b"now present"));
    }

    #[tokio::test]
    async fn test_file_type() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.pdf");
        std::fs::write(&path, b"%PDF-1.7").unwrap();
        let source = UrlSource::new(&path, probe(&dir, StubFrameExtractor::new(1, 1)));

        assert_eq!(source.media_type(), Some(MediaType::File));
        assert_eq!(source.media_type(), Some(MediaType::File));
        assert_eq!(source.thumbnail_url().await.unwrap(), Some(path.clone()));
        assert_eq!(source.thumbnail_data().await.unwrap(), None);
        assert_eq!(source.size().await.unwrap(), None);
        assert_eq!(source.duration().await.unwrap(), None);
        assert_eq!(source.byte_count().await.unwrap(), Some(8));
    }

    #[tokio::test]
    async fn test_video_thumbnail_bytes_are_cached() {
        let dir = TempDir::new().unwrap();
        let extractor = StubFrameExtractor::new(64, 48);
        let path = write_mp4(dir.path(), "clip.mov", 64, 48, 0.5);
        let source = UrlSource::new(&path, probe(&dir, extractor.clone()));

        let first = source.thumbnail_url().await.unwrap().unwrap();
        let second = source.thumbnail_url().await.unwrap().unwrap();

        assert_ne!(first, second);
        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
        assert_eq!(extractor.calls(), 1);
        let offset = extractor.last_offset.lock().unwrap();
        assert!((offset - 0.4).abs() < 1e-9);
    }
}
