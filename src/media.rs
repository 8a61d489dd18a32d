//! # Media
//!
//! Handle pubblico restituito al chiamante per ogni elemento selezionato.
//!
//! ## Responsabilità:
//! - `Media`: identità univoca nel processo e delega pura all'adapter
//! - `MediaResolver`: costruzione dei `Media` da URL, asset di libreria, risultati del picker
//!   o da tutti i file di una directory
//!
//! ## Esempio:
//! ```rust,no_run
//! use media_picker::{Config, MediaResolver, MediaType};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolver = MediaResolver::new(Config::default())?;
//! let media = resolver.media_for_url("holiday.jpg");
//!
//! assert_eq!(media.media_type(), MediaType::Image);
//! if let Some(size) = media.size().await? {
//!     println!("{} -> {}", media.id(), size);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::Config;
use crate::error::MediaResult;
use crate::file_manager::{FileManager, MediaType};
use crate::probe::{FrameExtractor, MediaProbe, PixelSize};
use crate::source::{AssetSource, AssetStore, ItemProvider, MediaSource, PickerSource, UrlSource};
use crate::utils::format_duration;
use anyhow::Result;
use bytes::Bytes;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A picked photo, video or file
#[derive(Debug, Clone)]
pub struct Media {
    id: Uuid,
    source: MediaSource,
}

impl PartialEq for Media {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Media {}

impl Hash for Media {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Media {
    pub fn new(source: impl Into<MediaSource>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    /// Content kind; unclassifiable content is reported as a file
    pub fn media_type(&self) -> MediaType {
        self.source.media_type().unwrap_or(MediaType::File)
    }

    pub async fn size(&self) -> MediaResult<Option<PixelSize>> {
        self.source.size().await
    }

    pub async fn byte_count(&self) -> MediaResult<Option<u64>> {
        self.source.byte_count().await
    }

    pub async fn duration(&self) -> MediaResult<Option<f64>> {
        self.source.duration().await
    }

    /// Duration as `m:ss` or `h:mm:ss`, for videos only
    pub async fn formatted_duration(&self) -> MediaResult<Option<String>> {
        Ok(self.duration().await?.map(format_duration))
    }

    pub async fn url(&self) -> MediaResult<Option<PathBuf>> {
        self.source.url().await
    }

    pub async fn thumbnail_url(&self) -> MediaResult<Option<PathBuf>> {
        self.source.thumbnail_url().await
    }

    pub async fn data(&self) -> MediaResult<Option<Bytes>> {
        self.source.data().await
    }

    pub async fn thumbnail_data(&self) -> MediaResult<Option<Bytes>> {
        self.source.thumbnail_data().await
    }
}

/// Builds [`Media`] handles that share one configuration and probe
#[derive(Debug, Clone)]
pub struct MediaResolver {
    probe: MediaProbe,
}

impl MediaResolver {
    /// Resolver decoding video frames with `ffmpeg`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let probe = MediaProbe::new(config);
        if let Err(e) = probe.platform().check_dependencies() {
            warn!("⚠️  {}: video thumbnails and non-MP4 containers are unavailable", e);
        }
        Ok(Self { probe })
    }

    /// Resolver decoding video frames with a host supplied extractor
    pub fn with_frame_extractor(config: Config, extractor: Arc<dyn FrameExtractor>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            probe: MediaProbe::with_frame_extractor(config, extractor),
        })
    }

    pub fn config(&self) -> &Config {
        self.probe.config()
    }

    pub fn probe(&self) -> &MediaProbe {
        &self.probe
    }

    pub fn media_for_url(&self, path: impl Into<PathBuf>) -> Media {
        Media::new(UrlSource::new(path, self.probe.clone()))
    }

    pub fn media_for_asset(&self, store: Arc<dyn AssetStore>, identifier: impl Into<String>) -> Media {
        Media::new(AssetSource::new(store, identifier, self.probe.clone()))
    }

    pub fn media_for_picker_result(&self, provider: Arc<dyn ItemProvider>) -> Media {
        Media::new(PickerSource::new(provider, self.probe.clone()))
    }

    /// One URL media per non-hidden file below `dir`, in path order
    pub fn media_in_directory(&self, dir: &Path) -> Vec<Media> {
        let media: Vec<Media> = FileManager::find_media_files(dir)
            .into_iter()
            .map(|path| self.media_for_url(path))
            .collect();

        info!("📁 Found {} files in {}", media.len(), dir.display());
        media
    }
}
