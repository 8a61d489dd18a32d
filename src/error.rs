//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore della risoluzione media.
//!
//! ## Responsabilità:
//! - Definisce `MediaError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per la conversione automatica degli errori
//! - È `Clone`: lo stesso fallimento viene consegnato a tutti i chiamanti
//!   che attendono la stessa risoluzione in corso
//!
//! ## Categorie di errori:
//! - `ImportFailed`: Contenuto non decodificabile o non transcodificabile
//! - `UnsupportedPlatform`: Operazione non disponibile sulla piattaforma corrente
//! - `NoImageData` / `NoVideoData`: L'asset store non ha consegnato contenuto
//! - `UnknownAssetType`: Asset né immagine né video
//! - `Io`, `Image`, `FFmpeg`, `Container`: Errori dei livelli sottostanti
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe)
//!
//! ## Assenza vs errore:
//! Un valore che non esiste per quel tipo di media (es. durata di una foto)
//! è `Ok(None)`, mai un errore.
//!
//! ## Esempio:
//! ```rust
//! use media_picker::MediaError;
//!
//! let err = MediaError::MissingDependency("ffmpeg".to_string());
//! assert_eq!(err.to_string(), "Dependency missing: ffmpeg");
//! ```

use std::sync::Arc;

/// Errors surfaced by media resolution
#[derive(thiserror::Error, Debug, Clone)]
pub enum MediaError {
    #[error("Import failed: {0}")]
    ImportFailed(String),

    #[error("Operation not supported on this platform")]
    UnsupportedPlatform,

    #[error("Asset returned no image data")]
    NoImageData,

    #[error("Asset returned no video data")]
    NoVideoData,

    #[error("Unknown asset type")]
    UnknownAssetType,

    #[error("IO error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Image processing error: {0}")]
    Image(Arc<image::ImageError>),

    #[error("FFmpeg error: {0}")]
    FFmpeg(String),

    #[error("Invalid container: {0}")]
    Container(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),
}

impl From<std::io::Error> for MediaError {
    fn from(err: std::io::Error) -> Self {
        MediaError::Io(Arc::new(err))
    }
}

impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self {
        MediaError::Image(Arc::new(err))
    }
}

impl From<tokio::task::JoinError> for MediaError {
    fn from(err: tokio::task::JoinError) -> Self {
        MediaError::ImportFailed(format!("background task failed: {}", err))
    }
}

/// Result type used by every resolution operation
pub type MediaResult<T> = std::result::Result<T, MediaError>;
