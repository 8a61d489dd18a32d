//! # Library Asset Source
//!
//! Adapter per gli asset della libreria media di sistema, raggiunti tramite un
//! `AssetStore` fornito dall'host.
//!
//! ## Responsabilità:
//! - Classificazione tramite il tipo riportato dalla libreria
//! - Richieste al backend con accesso di rete e consegna in alta qualità
//! - Consegna singola per i dati immagine: una seconda consegna è una violazione di contratto
//! - Cancellazione: la richiesta al backend viene annullata quando nessuno attende più il risultato

use super::cell::ResolutionCache;
use crate::error::{MediaError, MediaResult};
use crate::file_manager::{FileManager, MediaType};
use crate::probe::{MediaProbe, PixelSize};
use bytes::Bytes;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Handle of a pending backend request
pub type RequestId = u64;

/// Classification reported by the media library
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
    Audio,
    Unknown,
}

/// Options attached to every backend request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub network_access_allowed: bool,
    /// One final, full quality answer; no degraded placeholder first
    pub high_quality_delivery: bool,
}

impl RequestOptions {
    /// Network access allowed, single high quality delivery
    pub fn high_quality() -> Self {
        Self {
            network_access_allowed: true,
            high_quality_delivery: true,
        }
    }
}

/// Completion handle passed to the store with each request.
///
/// Exactly one delivery is allowed; dropping it undelivered means "no result".
pub struct Delivery<T> {
    sender: Option<oneshot::Sender<T>>,
}

impl<T> Delivery<T> {
    fn new(sender: oneshot::Sender<T>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Complete the request.
    ///
    /// # Panics
    ///
    /// Panics when called more than once: requests are issued in high quality
    /// mode, where a placeholder delivery followed by a final one must not happen.
    pub fn deliver(&mut self, value: T) {
        let Some(sender) = self.sender.take() else {
            panic!("asset store delivered more than once for a single-delivery request");
        };
        if sender.send(value).is_err() {
            debug!("Delivery dropped: request no longer awaited");
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.sender.is_none()
    }
}

/// Host media library
pub trait AssetStore: Send + Sync {
    /// Classification of the asset; `Unknown` when the identifier is not found
    fn asset_kind(&self, identifier: &str) -> AssetKind;

    /// Duration in seconds as recorded by the library, 0 when not known
    fn asset_duration(&self, identifier: &str) -> f64 {
        let _ = identifier;
        0.0
    }

    /// Locate a local file for an image or video asset
    fn request_file_url(
        &self,
        identifier: &str,
        options: &RequestOptions,
        delivery: Delivery<Option<PathBuf>>,
    ) -> RequestId;

    /// Fetch the encoded bytes of an image asset
    fn request_image_data(
        &self,
        identifier: &str,
        options: &RequestOptions,
        delivery: Delivery<Option<Bytes>>,
    ) -> RequestId;

    fn cancel_request(&self, request: RequestId);
}

/// Cancels the backend request unless disarmed
struct CancelOnDrop {
    store: Arc<dyn AssetStore>,
    request: RequestId,
    armed: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            debug!("Cancelling asset request {}", self.request);
            self.store.cancel_request(self.request);
        }
    }
}

/// Issue a request and wait for its single delivery; `None` if the store dropped it
async fn await_delivery<T>(
    store: &Arc<dyn AssetStore>,
    start: impl FnOnce(Delivery<T>) -> RequestId,
) -> Option<T> {
    let (sender, receiver) = oneshot::channel();
    let request = start(Delivery::new(sender));
    let mut guard = CancelOnDrop {
        store: Arc::clone(store),
        request,
        armed: true,
    };

    let delivered = receiver.await.ok();
    guard.armed = false;
    delivered
}

struct AssetInner {
    identifier: String,
    kind: AssetKind,
    store: Arc<dyn AssetStore>,
    probe: MediaProbe,
    cache: ResolutionCache,
}

/// Adapter over an asset of the host media library
#[derive(Clone)]
pub struct AssetSource {
    inner: Arc<AssetInner>,
}

impl fmt::Debug for AssetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetSource")
            .field("identifier", &self.inner.identifier)
            .field("kind", &self.inner.kind)
            .finish()
    }
}

impl AssetSource {
    pub fn new(store: Arc<dyn AssetStore>, identifier: impl Into<String>, probe: MediaProbe) -> Self {
        let identifier = identifier.into();
        let kind = store.asset_kind(&identifier);
        Self {
            inner: Arc::new(AssetInner {
                identifier,
                kind,
                store,
                probe,
                cache: ResolutionCache::new(),
            }),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.inner.identifier
    }

    pub fn media_type(&self) -> Option<MediaType> {
        Some(match self.inner.kind {
            AssetKind::Image => MediaType::Image,
            AssetKind::Video => MediaType::Video,
            AssetKind::Audio | AssetKind::Unknown => MediaType::File,
        })
    }

    fn is_visual(&self) -> bool {
        matches!(self.inner.kind, AssetKind::Image | AssetKind::Video)
    }

    /// Local file of an image or video asset; a request answered without a file is an error
    pub async fn url(&self) -> MediaResult<Option<PathBuf>> {
        if !self.is_visual() {
            return Ok(None);
        }

        let inner = Arc::clone(&self.inner);
        self.inner
            .cache
            .url
            .get_or_resolve(move || async move {
                debug!("Requesting file for asset {}", inner.identifier);
                let options = RequestOptions::high_quality();
                let url = await_delivery(&inner.store, |delivery| {
                    inner.store.request_file_url(&inner.identifier, &options, delivery)
                })
                .await
                .flatten();
                match url {
                    Some(path) => Ok(Some(path)),
                    None => {
                        warn!("⚠️  No file available for asset {}", inner.identifier);
                        Err(match inner.kind {
                            AssetKind::Video => MediaError::NoVideoData,
                            _ => MediaError::NoImageData,
                        })
                    }
                }
            })
            .await
    }

    pub async fn data(&self) -> MediaResult<Option<Bytes>> {
        let this = self.clone();
        self.inner
            .cache
            .data
            .get_or_resolve(move || async move {
                let inner = &this.inner;
                match inner.kind {
                    AssetKind::Image => {
                        debug!("Requesting image data for asset {}", inner.identifier);
                        let options = RequestOptions::high_quality();
                        let data = await_delivery(&inner.store, |delivery| {
                            inner.store.request_image_data(&inner.identifier, &options, delivery)
                        })
                        .await
                        .flatten()
                        .ok_or(MediaError::NoImageData)?;
                        Ok(Some(data))
                    }
                    AssetKind::Video => {
                        let path = this.url().await?.ok_or(MediaError::NoVideoData)?;
                        Ok(Some(Bytes::from(tokio::fs::read(&path).await?)))
                    }
                    AssetKind::Audio | AssetKind::Unknown => Err(MediaError::UnknownAssetType),
                }
            })
            .await
    }

    pub async fn thumbnail_data(&self) -> MediaResult<Option<Bytes>> {
        match self.inner.kind {
            AssetKind::Image => self.data().await,
            AssetKind::Video => {
                let this = self.clone();
                self.inner
                    .cache
                    .thumbnail
                    .get_or_resolve(move || async move {
                        let Some(path) = this.url().await? else {
                            return Ok(None);
                        };
                        Ok(this.inner.probe.video_thumbnail_data(&path).await)
                    })
                    .await
            }
            AssetKind::Audio | AssetKind::Unknown => Ok(None),
        }
    }

    pub async fn thumbnail_url(&self) -> MediaResult<Option<PathBuf>> {
        match self.inner.kind {
            AssetKind::Image => self.url().await,
            AssetKind::Video => match self.thumbnail_data().await? {
                Some(data) => Ok(Some(self.inner.probe.store_thumbnail(data).await?)),
                None => Ok(None),
            },
            AssetKind::Audio | AssetKind::Unknown => Ok(None),
        }
    }

    pub async fn size(&self) -> MediaResult<Option<PixelSize>> {
        if !self.is_visual() {
            return Ok(None);
        }

        let this = self.clone();
        self.inner
            .cache
            .size
            .get_or_resolve(move || async move {
                let probe = &this.inner.probe;
                match this.inner.kind {
                    AssetKind::Image => match this.data().await? {
                        Some(data) => Ok(Some(probe.image_size_from_bytes(data).await?)),
                        None => Ok(None),
                    },
                    _ => match this.url().await? {
                        Some(path) => probe.video_size(&path).await,
                        None => Ok(None),
                    },
                }
            })
            .await
    }

    pub async fn byte_count(&self) -> MediaResult<Option<u64>> {
        let this = self.clone();
        self.inner
            .cache
            .byte_count
            .get_or_resolve(move || async move {
                match this.inner.kind {
                    AssetKind::Image => Ok(this.data().await?.map(|data| data.len() as u64)),
                    AssetKind::Video => {
                        let path = this.url().await?.ok_or(MediaError::NoVideoData)?;
                        Ok(Some(FileManager::byte_count(&path).await?))
                    }
                    AssetKind::Audio | AssetKind::Unknown => Err(MediaError::UnknownAssetType),
                }
            })
            .await
    }

    pub async fn duration(&self) -> MediaResult<Option<f64>> {
        if self.inner.kind != AssetKind::Video {
            return Ok(None);
        }

        let this = self.clone();
        self.inner
            .cache
            .duration
            .get_or_resolve(move || async move {
                let recorded = this.inner.store.asset_duration(&this.inner.identifier);
                if recorded.is_finite() && recorded > 0.0 {
                    return Ok(Some(recorded));
                }
                match this.url().await? {
                    Some(path) => this.inner.probe.video_duration(&path).await,
                    None => Ok(None),
                }
            })
            .await
    }
}
