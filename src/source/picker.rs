//! # Picker Result Source
//!
//! Adapter per i risultati del picker di sistema, esposti come `ItemProvider`.
//!
//! ## Classificazione:
//! - Conforme a immagine → foto
//! - Conforme a filmato → video
//! - Altrimenti nessuna classificazione: ogni accessor restituisce `None`
//!
//! ## Materializzazione:
//! - Foto: rappresentazione dati caricata una volta, transcodificata in JPEG in un file temporaneo
//! - Video: rappresentazione file copiata in un file temporaneo, perché il file del provider
//!   è valido solo durante il caricamento

use super::cell::ResolutionCache;
use crate::error::{MediaError, MediaResult};
use crate::file_manager::{FileManager, MediaType};
use crate::probe::{MediaProbe, PixelSize};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Content types a picked item can conform to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Image,
    Movie,
}

/// A picked item as handed over by the system picker
#[async_trait]
pub trait ItemProvider: Send + Sync {
    fn has_item_conforming_to(&self, content_type: ContentType) -> bool;

    /// Load the item's bytes in the given representation
    async fn load_data_representation(&self, content_type: ContentType) -> MediaResult<Bytes>;

    /// Load the item as a file. The returned path may be removed by the provider
    /// once the load is over, so callers copy it right away.
    async fn load_file_representation(&self, content_type: ContentType) -> MediaResult<PathBuf>;
}

struct PickerInner {
    provider: Arc<dyn ItemProvider>,
    media_type: Option<MediaType>,
    probe: MediaProbe,
    cache: ResolutionCache,
}

/// Adapter over a system picker result
#[derive(Clone)]
pub struct PickerSource {
    inner: Arc<PickerInner>,
}

impl fmt::Debug for PickerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickerSource")
            .field("media_type", &self.inner.media_type)
            .finish_non_exhaustive()
    }
}

impl PickerSource {
    pub fn new(provider: Arc<dyn ItemProvider>, probe: MediaProbe) -> Self {
        let media_type = if provider.has_item_conforming_to(ContentType::Image) {
            Some(MediaType::Image)
        } else if provider.has_item_conforming_to(ContentType::Movie) {
            Some(MediaType::Video)
        } else {
            None
        };

        Self {
            inner: Arc::new(PickerInner {
                provider,
                media_type,
                probe,
                cache: ResolutionCache::new(),
            }),
        }
    }

    /// `None` when the item conforms to neither images nor movies
    pub fn media_type(&self) -> Option<MediaType> {
        self.inner.media_type
    }

    pub async fn url(&self) -> MediaResult<Option<PathBuf>> {
        match self.inner.media_type {
            Some(MediaType::Image) => self.photo_url().await.map(Some),
            Some(MediaType::Video) => self.movie_url().await.map(Some),
            _ => Ok(None),
        }
    }

    pub async fn data(&self) -> MediaResult<Option<Bytes>> {
        match self.inner.media_type {
            Some(MediaType::Image) => self.photo_data().await.map(Some),
            Some(MediaType::Video) => {
                let this = self.clone();
                self.inner
                    .cache
                    .data
                    .get_or_resolve(move || async move {
                        let path = this.movie_url().await?;
                        Ok(Some(Bytes::from(tokio::fs::read(&path).await?)))
                    })
                    .await
            }
            _ => Ok(None),
        }
    }

    async fn photo_data(&self) -> MediaResult<Bytes> {
        let inner = Arc::clone(&self.inner);
        let data = self
            .inner
            .cache
            .data
            .get_or_resolve(move || async move {
                let data = inner
                    .provider
                    .load_data_representation(ContentType::Image)
                    .await?;
                Ok(Some(data))
            })
            .await?;
        data.ok_or_else(|| MediaError::ImportFailed("picked photo has no data".to_string()))
    }

    async fn photo_url(&self) -> MediaResult<PathBuf> {
        let this = self.clone();
        let url = self
            .inner
            .cache
            .url
            .get_or_resolve(move || async move {
                let data = this.photo_data().await?;
                let path = this.inner.probe.transcode_photo(data).await?;
                debug!("Picked photo stored at {}", path.display());
                Ok(Some(path))
            })
            .await?;
        url.ok_or_else(|| MediaError::ImportFailed("picked photo has no file".to_string()))
    }

    async fn movie_url(&self) -> MediaResult<PathBuf> {
        let inner = Arc::clone(&self.inner);
        let url = self
            .inner
            .cache
            .url
            .get_or_resolve(move || async move {
                let loaded = inner
                    .provider
                    .load_file_representation(ContentType::Movie)
                    .await?;
                let path = inner.probe.copy_to_temp(&loaded).await?;
                debug!("Picked movie copied to {}", path.display());
                Ok(Some(path))
            })
            .await?;
        url.ok_or_else(|| MediaError::ImportFailed("picked movie has no file".to_string()))
    }

    pub async fn thumbnail_data(&self) -> MediaResult<Option<Bytes>> {
        match self.inner.media_type {
            Some(MediaType::Image) => self.data().await,
            Some(MediaType::Video) => {
                let this = self.clone();
                self.inner
                    .cache
                    .thumbnail
                    .get_or_resolve(move || async move {
                        let path = this.movie_url().await?;
                        Ok(this.inner.probe.video_thumbnail_data(&path).await)
                    })
                    .await
            }
            _ => Ok(None),
        }
    }

    pub async fn thumbnail_url(&self) -> MediaResult<Option<PathBuf>> {
        match self.inner.media_type {
            Some(MediaType::Image) => self.url().await,
            Some(MediaType::Video) => match self.thumbnail_data().await? {
                Some(data) => Ok(Some(self.inner.probe.store_thumbnail(data).await?)),
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub async fn size(&self) -> MediaResult<Option<PixelSize>> {
        let this = self.clone();
        match self.inner.media_type {
            Some(MediaType::Image) => {
                self.inner
                    .cache
                    .size
                    .get_or_resolve(move || async move {
                        let data = this.photo_data().await?;
                        Ok(Some(this.inner.probe.image_size_from_bytes(data).await?))
                    })
                    .await
            }
            Some(MediaType::Video) => {
                self.inner
                    .cache
                    .size
                    .get_or_resolve(move || async move {
                        let path = this.movie_url().await?;
                        this.inner.probe.video_size(&path).await
                    })
                    .await
            }
            _ => Ok(None),
        }
    }

    pub async fn byte_count(&self) -> MediaResult<Option<u64>> {
        let this = self.clone();
        match self.inner.media_type {
            Some(MediaType::Image) => {
                self.inner
                    .cache
                    .byte_count
                    .get_or_resolve(move || async move {
                        Ok(Some(this.photo_data().await?.len() as u64))
                    })
                    .await
            }
            Some(MediaType::Video) => {
                self.inner
                    .cache
                    .byte_count
                    .get_or_resolve(move || async move {
                        let path = this.movie_url().await?;
                        Ok(Some(FileManager::byte_count(&path).await?))
                    })
                    .await
            }
            _ => Ok(None),
        }
    }

    pub async fn duration(&self) -> MediaResult<Option<f64>> {
        if self.inner.media_type != Some(MediaType::Video) {
            return Ok(None);
        }

        let this = self.clone();
        self.inner
            .cache
            .duration
            .get_or_resolve(move || async move {
                let path = this.movie_url().await?;
                this.inner.probe.video_duration(&path).await
            })
            .await
    }
}
