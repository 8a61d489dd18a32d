//! # Media Picker Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare della libreria
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia unica (`Media`) sopra le diverse origini del contenuto
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore della risoluzione
//! - `media`: Handle pubblico `Media` e costruzione tramite `MediaResolver`
//! - `source`: Adapter per asset di libreria, risultati del picker e file locali
//! - `probe`: Dimensioni, durata e thumbnail dei file risolti
//! - `file_manager`: Classificazione, discovery e file temporanei
//! - `library_changes`: Notifiche di cambio permessi iniettate dall'host
//! - `platform` / `tool_resolver`: Individuazione di ffmpeg e ffprobe
//! - `logging`: Setup del subscriber `tracing`
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use media_picker::{Config, MediaResolver};
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let resolver = MediaResolver::new(Config::default())?;
//! for media in resolver.media_in_directory(Path::new("/tmp/picked")) {
//!     let thumbnail = media.thumbnail_url().await?;
//!     println!("{:?}: {:?}", media.media_type(), thumbnail);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file_manager;
pub mod library_changes;
pub mod logging;
pub mod media;
pub mod platform;
pub mod probe;
pub mod source;
pub mod tool_resolver;
pub mod utils;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{MediaError, MediaResult};
pub use file_manager::{FileManager, MediaType};
pub use library_changes::{LibraryChange, LibraryChangeNotifier};
pub use media::{Media, MediaResolver};
pub use probe::{FfmpegFrameExtractor, FrameExtractor, MediaProbe, PixelSize, VideoMetadata};
pub use source::{
    AssetKind, AssetSource, AssetStore, ContentType, Delivery, ItemProvider, MediaSource,
    PickerSource, RequestId, RequestOptions, UrlSource,
};
