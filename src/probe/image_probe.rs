//! Still image helpers: header-only size probing, JPEG encoding and
//! thumbnail downscaling. Everything here is CPU bound and blocking; the
//! async probe runs it on the blocking pool.

use super::PixelSize;
use crate::error::{MediaError, MediaResult};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage};
use std::io::Cursor;
use std::path::Path;

/// Native pixel size of an image file, read from its header
pub fn size_from_path(path: &Path) -> MediaResult<PixelSize> {
    let (width, height) = image::io::Reader::open(path)?
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(PixelSize::new(width, height))
}

/// Native pixel size of an encoded image held in memory
pub fn size_from_bytes(data: &[u8]) -> MediaResult<PixelSize> {
    let (width, height) = image::io::Reader::new(Cursor::new(data))
        .with_guessed_format()?
        .into_dimensions()?;
    Ok(PixelSize::new(width, height))
}

/// Encode as baseline JPEG; alpha is dropped
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> MediaResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality).encode(
        rgb.as_raw(),
        rgb.width(),
        rgb.height(),
        ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Bound the longer side to `max_dimension`, keeping aspect ratio. Never upscales.
pub fn downscale(image: DynamicImage, max_dimension: Option<u32>) -> DynamicImage {
    match max_dimension {
        Some(max) if image.width() > max || image.height() > max => image.thumbnail(max, max),
        _ => image,
    }
}

/// Decode any supported still format and re-encode it as JPEG
pub fn transcode_to_jpeg(data: &[u8], quality: u8) -> MediaResult<Vec<u8>> {
    let decoded = image::load_from_memory(data)
        .map_err(|e| MediaError::ImportFailed(format!("cannot decode picked photo: {}", e)))?;
    encode_jpeg(&decoded, quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::jpeg_bytes;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_size_from_bytes() {
        let data = jpeg_bytes(10, 10);
        assert_eq!(size_from_bytes(&data).unwrap(), PixelSize::new(10, 10));
    }

    #[test]
    fn test_size_of_garbage_is_an_error() {
        assert!(size_from_bytes(b"not an image").is_err());
    }

    #[test]
    fn test_encode_jpeg_drops_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 128])));
        let jpeg = encode_jpeg(&rgba, 80).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        assert_eq!(size_from_bytes(&jpeg).unwrap(), PixelSize::new(4, 3));
    }

    #[test]
    fn test_downscale_keeps_aspect_ratio() {
        let wide = DynamicImage::new_rgb8(640, 480);
        let small = downscale(wide, Some(300));
        assert_eq!((small.width(), small.height()), (300, 225));

        let tiny = downscale(DynamicImage::new_rgb8(20, 10), Some(300));
        assert_eq!((tiny.width(), tiny.height()), (20, 10));
    }

    #[test]
    fn test_transcode_rejects_undecodable_data() {
        let err = transcode_to_jpeg(b"\x00\x01\x02", 100).unwrap_err();
        assert!(matches!(err, MediaError::ImportFailed(_)));
    }
}
