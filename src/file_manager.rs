//! # File Management Module
//!
//! Questo modulo gestisce tutte le operazioni sui file usate dagli adapter.
//!
//! ## Responsabilità:
//! - Classificazione dei file per estensione (immagine, video, altro)
//! - Discovery dei file selezionabili in una directory
//! - Scrittura dei file temporanei (thumbnail, foto transcodificate, copie video)
//! - Dimensione in byte e formattazione human-readable
//!
//! ## File temporanei:
//! - Nome casuale (prefisso `media-`) con estensione del formato codificato
//! - Scritti una sola volta, mai condivisi fra due scritture
//! - Nessuna pulizia automatica: resta compito del processo host / del sistema
//!
//! ## Esempio:
//! ```rust
//! use media_picker::{FileManager, MediaType};
//! use std::path::Path;
//!
//! assert_eq!(FileManager::classify(Path::new("IMG_001.HEIC")), MediaType::Image);
//! assert_eq!(FileManager::classify(Path::new("clip.mov")), MediaType::Video);
//! assert_eq!(FileManager::classify(Path::new("notes.pdf")), MediaType::File);
//! ```

use crate::error::MediaResult;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "heic", "heif", "bmp", "tif", "tiff", "avif",
];

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "avi", "mkv", "webm", "3gp", "3g2", "mpg", "mpeg", "wmv", "flv", "ts",
];

/// Kind of picked content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    File,
}

/// Manages file classification and temporary storage
pub struct FileManager;

impl FileManager {
    fn extension(path: &Path) -> Option<String> {
        path.extension().map(|ext| ext.to_string_lossy().to_lowercase())
    }

    /// Check if a file is an image
    pub fn is_image(path: &Path) -> bool {
        Self::extension(path).map_or(false, |ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Check if a file is a video
    pub fn is_video(path: &Path) -> bool {
        Self::extension(path).map_or(false, |ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
    }

    /// Classify a file by extension
    pub fn classify(path: &Path) -> MediaType {
        if Self::is_image(path) {
            MediaType::Image
        } else if Self::is_video(path) {
            MediaType::Video
        } else {
            MediaType::File
        }
    }

    /// Size of a file in bytes
    pub async fn byte_count(path: &Path) -> MediaResult<u64> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    /// Find every pickable (regular, non-hidden) file in a directory, sorted by path
    pub fn find_media_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();

        files.sort();
        files
    }

    /// Write `data` to a new, uniquely named file in `dir`
    pub async fn store_to_temp_dir(dir: &Path, data: Bytes, extension: &str) -> MediaResult<PathBuf> {
        let dir = dir.to_path_buf();
        let suffix = format!(".{}", extension);

        let path = tokio::task::spawn_blocking(move || -> MediaResult<PathBuf> {
            let mut file = tempfile::Builder::new()
                .prefix("media-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&data)?;
            let (_, path) = file.keep().map_err(|e| e.error)?;
            Ok(path)
        })
        .await??;

        debug!("Stored temporary file: {}", path.display());
        Ok(path)
    }

    /// Copy `source` to a new, uniquely named file in `dir`, keeping its extension
    pub async fn copy_to_temp_dir(dir: &Path, source: &Path) -> MediaResult<PathBuf> {
        let suffix = Self::extension(source)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let dir = dir.to_path_buf();

        let target = tokio::task::spawn_blocking(move || -> MediaResult<PathBuf> {
            let file = tempfile::Builder::new()
                .prefix("media-")
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            let (_, path) = file.keep().map_err(|e| e.error)?;
            Ok(path)
        })
        .await??;

        tokio::fs::copy(source, &target).await?;
        debug!("Copied {} to {}", source.display(), target.display());
        Ok(target)
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_classification_is_case_insensitive() {
        assert!(FileManager::is_image(Path::new("a/B.JPG")));
        assert!(FileManager::is_video(Path::new("clip.MkV")));
        assert_eq!(FileManager::classify(Path::new("archive.tar.gz")), MediaType::File);
        assert_eq!(FileManager::classify(Path::new("README")), MediaType::File);
    }

    #[tokio::test]
    async fn test_store_to_temp_dir_uses_unique_names() {
        let dir = TempDir::new().unwrap();
        let data = Bytes::from_static(b"thumbnail");

        let first = FileManager::store_to_temp_dir(dir.path(), data.clone(), "jpg").await.unwrap();
        let second = FileManager::store_to_temp_dir(dir.path(), data, "jpg").await.unwrap();

        assert_ne!(first, second);
        assert_eq!(first.extension().unwrap(), "jpg");
        assert!(first.starts_with(dir.path()));
        assert_eq!(std::fs::read(&first).unwrap(), b"thumbnail");
    }

    #[tokio::test]
    async fn test_copy_to_temp_dir_keeps_extension() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("movie.MOV");
        std::fs::write(&source, b"moov").unwrap();

        let copy = FileManager::copy_to_temp_dir(dir.path(), &source).await.unwrap();
        assert_ne!(copy, source);
        assert_eq!(copy.extension().unwrap(), "mov");
        assert_eq!(FileManager::byte_count(&copy).await.unwrap(), 4);
    }

    #[test]
    fn test_find_media_files_skips_hidden() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
        std::fs::write(dir.path().join("b.png"), b"").unwrap();
        std::fs::write(dir.path().join("nested/a.mp4"), b"").unwrap();
        std::fs::write(dir.path().join(".DS_Store"), b"").unwrap();
        std::fs::write(dir.path().join(".cache/c.jpg"), b"").unwrap();

        let files = FileManager::find_media_files(dir.path());
        assert_eq!(files, vec![dir.path().join("b.png"), dir.path().join("nested/a.mp4")]);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(FileManager::format_size(512), "512 B");
        assert_eq!(FileManager::format_size(2048), "2.00 KB");
        assert_eq!(FileManager::format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
