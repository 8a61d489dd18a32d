//! Fixtures shared by the unit tests: encoded images, a minimal MP4 writer
//! and a frame extractor that does not need ffmpeg.

use crate::error::{MediaError, MediaResult};
use crate::probe::FrameExtractor;
use async_trait::async_trait;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([200, 40, 40])));
    crate::probe::image_probe::encode_jpeg(&image, 90).unwrap()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([0, 90, 200])));
    let mut out = std::io::Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageOutputFormat::Png).unwrap();
    out.into_inner()
}

pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_bytes(width, height)).unwrap();
    path
}

pub fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn push_u32(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn trak(handler: &[u8; 4], width: u32, height: u32, timescale: u32, duration: u32) -> Vec<u8> {
    let mut tkhd = vec![0, 0, 0, 7];
    push_u32(&mut tkhd, 0); // creation
    push_u32(&mut tkhd, 0); // modification
    push_u32(&mut tkhd, 1); // track id
    push_u32(&mut tkhd, 0); // reserved
    push_u32(&mut tkhd, duration);
    tkhd.extend_from_slice(&[0u8; 16]); // reserved, layer, group, volume
    tkhd.extend_from_slice(&[0u8; 36]); // matrix
    push_u32(&mut tkhd, width << 16);
    push_u32(&mut tkhd, height << 16);

    let mut mdhd = vec![0, 0, 0, 0];
    push_u32(&mut mdhd, 0);
    push_u32(&mut mdhd, 0);
    push_u32(&mut mdhd, timescale);
    push_u32(&mut mdhd, duration);
    mdhd.extend_from_slice(&[0u8; 4]);

    let mut hdlr = vec![0u8; 8];
    hdlr.extend_from_slice(handler);
    hdlr.extend_from_slice(&[0u8; 12]);
    hdlr.extend_from_slice(b"Handler\0");

    let mut mdia = mp4_box(b"mdhd", &mdhd);
    mdia.extend(mp4_box(b"hdlr", &hdlr));

    let mut body = mp4_box(b"tkhd", &tkhd);
    body.extend(mp4_box(b"mdia", &mdia));
    mp4_box(b"trak", &body)
}

fn mp4_with_track(handler: &[u8; 4], width: u32, height: u32, duration_secs: f64) -> Vec<u8> {
    let timescale = 1000u32;
    let duration = (duration_secs * timescale as f64).round() as u32;

    let mut mvhd = vec![0, 0, 0, 0];
    push_u32(&mut mvhd, 0);
    push_u32(&mut mvhd, 0);
    push_u32(&mut mvhd, timescale);
    push_u32(&mut mvhd, duration);
    mvhd.resize(100, 0);

    let mut moov = mp4_box(b"mvhd", &mvhd);
    moov.extend(trak(handler, width, height, timescale, duration));

    let mut file = mp4_box(b"ftyp", b"isom\0\0\x02\0isomiso2mp41");
    file.extend(mp4_box(b"moov", &moov));
    file.extend(mp4_box(b"mdat", &[]));
    file
}

/// ISO BMFF file with a single video track; no sample data
pub fn mp4_bytes(width: u32, height: u32, duration_secs: f64) -> Vec<u8> {
    mp4_with_track(b"vide", width, height, duration_secs)
}

/// ISO BMFF file with a single audio track
pub fn audio_only_mp4_bytes(duration_secs: f64) -> Vec<u8> {
    mp4_with_track(b"soun", 0, 0, duration_secs)
}

pub fn write_mp4(dir: &Path, name: &str, width: u32, height: u32, duration_secs: f64) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, mp4_bytes(width, height, duration_secs)).unwrap();
    path
}

/// Frame extractor returning a solid frame of the given size, counting calls
#[derive(Default)]
pub struct StubFrameExtractor {
    pub width: u32,
    pub height: u32,
    pub calls: AtomicUsize,
    pub last_offset: parking_lot::Mutex<Option<f64>>,
    pub fail: bool,
}

impl StubFrameExtractor {
    pub fn new(width: u32, height: u32) -> Arc<Self> {
        Arc::new(Self { width, height, ..Default::default() })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { fail: true, ..Default::default() })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameExtractor for StubFrameExtractor {
    async fn extract_frame(&self, _path: &Path, at_secs: f64) -> MediaResult<DynamicImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_offset.lock() = Some(at_secs);
        if self.fail {
            return Err(MediaError::FFmpeg("stub decoder failure".to_string()));
        }
        Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(self.width, self.height, Rgb([1, 2, 3]))))
    }
}
