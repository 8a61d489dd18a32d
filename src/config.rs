//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione della risoluzione media.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri di thumbnail, transcodifica e probe
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `thumbnail_quality`: Qualità JPEG dei thumbnail video (1-100, default: 80)
//! - `photo_quality`: Qualità JPEG delle foto transcodificate (1-100, default: 100)
//! - `thumbnail_offset_secs`: Istante del frame usato come thumbnail (default: 1.0)
//! - `thumbnail_max_dimension`: Lato massimo del thumbnail (default: 300, None = nativo)
//! - `temp_dir`: Directory per i file temporanei (default: None = temp del sistema)
//! - `probe_timeout_secs`: Timeout per ogni invocazione di ffmpeg/ffprobe (default: 30)
//! - `tools_dir`: Directory aggiuntiva dove cercare ffmpeg/ffprobe (default: None)
//!
//! ## Esempio:
//! ```rust
//! use media_picker::Config;
//!
//! let config = Config {
//!     thumbnail_quality: 70,
//!     thumbnail_max_dimension: None,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for media resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JPEG quality for generated video thumbnails (1-100)
    pub thumbnail_quality: u8,
    /// JPEG quality when transcoding picked photos to a file (1-100)
    pub photo_quality: u8,
    /// Timestamp of the frame used as video thumbnail, in seconds
    pub thumbnail_offset_secs: f64,
    /// Bound on the longer side of video thumbnails (None = native frame size)
    pub thumbnail_max_dimension: Option<u32>,
    /// Directory for temporary files (None = OS temp dir)
    pub temp_dir: Option<PathBuf>,
    /// Timeout for each external tool invocation
    pub probe_timeout_secs: u64,
    /// Extra directory searched for ffmpeg/ffprobe
    pub tools_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thumbnail_quality: 80,
            photo_quality: 100,
            thumbnail_offset_secs: 1.0,
            thumbnail_max_dimension: Some(300),
            temp_dir: None,
            probe_timeout_secs: 30,
            tools_dir: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.thumbnail_quality == 0 || self.thumbnail_quality > 100 {
            return Err(anyhow::anyhow!("Thumbnail quality must be between 1 and 100"));
        }

        if self.photo_quality == 0 || self.photo_quality > 100 {
            return Err(anyhow::anyhow!("Photo quality must be between 1 and 100"));
        }

        if !self.thumbnail_offset_secs.is_finite() || self.thumbnail_offset_secs < 0.0 {
            return Err(anyhow::anyhow!("Thumbnail offset must be a non-negative number of seconds"));
        }

        if self.thumbnail_max_dimension == Some(0) {
            return Err(anyhow::anyhow!("Thumbnail max dimension must be greater than 0"));
        }

        if self.probe_timeout_secs == 0 {
            return Err(anyhow::anyhow!("Probe timeout must be greater than 0"));
        }

        if let Some(ref temp_dir) = self.temp_dir {
            if !temp_dir.is_dir() {
                return Err(anyhow::anyhow!("Temp directory does not exist: {}", temp_dir.display()));
            }
        }

        Ok(())
    }

    /// Directory where temporary thumbnails, photos and movie copies are written
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Load configuration from file, falling back to defaults when it is missing
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
