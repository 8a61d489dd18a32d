//! # Media Sources
//!
//! Un adapter per ogni origine del contenuto scelto dall'utente, tutti con lo
//! stesso insieme di capacità.
//!
//! ## Architettura:
//! - `cell`: stato di risoluzione memoizzato per ogni tipo di valore
//! - `asset`: asset della libreria media (`AssetStore` fornito dall'host)
//! - `picker`: risultati del picker di sistema (`ItemProvider`)
//! - `url`: file locali
//!
//! ## Garanzie comuni:
//! - `media_type()` è sincrono, puro e stabile
//! - Al più una risoluzione in corso per (adapter, tipo di valore); i chiamanti concorrenti la condividono
//! - Un valore risolto viene riusato per tutta la vita dell'adapter, un errore no

pub mod asset;
pub mod cell;
pub mod picker;
pub mod url;

pub use asset::{AssetKind, AssetSource, AssetStore, Delivery, RequestId, RequestOptions};
pub use cell::{ResolutionCache, ResolutionCell};
pub use picker::{ContentType, ItemProvider, PickerSource};
pub use url::UrlSource;

use crate::error::MediaResult;
use crate::file_manager::MediaType;
use crate::probe::PixelSize;
use bytes::Bytes;
use std::path::PathBuf;

/// The adapter behind a [`crate::Media`]
#[derive(Debug, Clone)]
pub enum MediaSource {
    LibraryAsset(AssetSource),
    PickerResult(PickerSource),
    Url(UrlSource),
}

macro_rules! delegate {
    ($self:ident, $method:ident) => {
        match $self {
            MediaSource::LibraryAsset(source) => source.$method().await,
            MediaSource::PickerResult(source) => source.$method().await,
            MediaSource::Url(source) => source.$method().await,
        }
    };
}

impl MediaSource {
    /// Classification; `None` for a picker result of no known content type
    pub fn media_type(&self) -> Option<MediaType> {
        match self {
            MediaSource::LibraryAsset(source) => source.media_type(),
            MediaSource::PickerResult(source) => source.media_type(),
            MediaSource::Url(source) => source.media_type(),
        }
    }

    pub async fn duration(&self) -> MediaResult<Option<f64>> {
        delegate!(self, duration)
    }

    pub async fn url(&self) -> MediaResult<Option<PathBuf>> {
        delegate!(self, url)
    }

    pub async fn thumbnail_url(&self) -> MediaResult<Option<PathBuf>> {
        delegate!(self, thumbnail_url)
    }

    pub async fn data(&self) -> MediaResult<Option<Bytes>> {
        delegate!(self, data)
    }

    pub async fn thumbnail_data(&self) -> MediaResult<Option<Bytes>> {
        delegate!(self, thumbnail_data)
    }

    pub async fn size(&self) -> MediaResult<Option<PixelSize>> {
        delegate!(self, size)
    }

    pub async fn byte_count(&self) -> MediaResult<Option<u64>> {
        delegate!(self, byte_count)
    }
}

impl From<AssetSource> for MediaSource {
    fn from(source: AssetSource) -> Self {
        MediaSource::LibraryAsset(source)
    }
}

impl From<PickerSource> for MediaSource {
    fn from(source: PickerSource) -> Self {
        MediaSource::PickerResult(source)
    }
}

impl From<UrlSource> for MediaSource {
    fn from(source: UrlSource) -> Self {
        MediaSource::Url(source)
    }
}
