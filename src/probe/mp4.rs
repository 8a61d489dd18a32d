//! # MP4 Container Probe
//!
//! Parser minimale del box `moov` (ISO BMFF) per leggere durata e dimensioni
//! naturali delle tracce senza tool esterni.
//!
//! ## Box letti:
//! - `mvhd`: timescale e durata del filmato (versione 0 e 1)
//! - `trak/tkhd`: id traccia e dimensioni naturali (fixed point 16.16)
//! - `trak/mdia/hdlr`: tipo di traccia (`vide`, `soun`, ...)
//! - `trak/mdia/mdhd`: durata della traccia, usata se `mvhd` non la riporta
//!
//! I box di primo livello vengono saltati con `seek`: anche un `moov` posto
//! dopo un `mdat` di diversi GB viene trovato senza leggere il contenuto media.

use crate::error::{MediaError, MediaResult};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

/// Upper bound on the `moov` payload we are willing to buffer
const MAX_MOOV_SIZE: u64 = 64 * 1024 * 1024;

/// Information about a single `trak` box
#[derive(Debug, Clone, PartialEq)]
pub struct TrackInfo {
    pub track_id: u32,
    pub handler: [u8; 4],
    /// Natural width in pixels (0 for non-visual tracks)
    pub width: f64,
    /// Natural height in pixels (0 for non-visual tracks)
    pub height: f64,
    pub duration_secs: Option<f64>,
}

impl TrackInfo {
    pub fn is_video(&self) -> bool {
        &self.handler == b"vide"
    }
}

/// Metadata extracted from a `moov` box
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mp4Metadata {
    pub duration_secs: Option<f64>,
    pub tracks: Vec<TrackInfo>,
}

impl Mp4Metadata {
    pub fn first_video_track(&self) -> Option<&TrackInfo> {
        self.tracks.iter().find(|track| track.is_video())
    }

    /// Movie duration, falling back to the longest track
    pub fn duration(&self) -> Option<f64> {
        self.duration_secs.or_else(|| {
            self.tracks
                .iter()
                .filter_map(|track| track.duration_secs)
                .fold(None, |longest: Option<f64>, d| Some(longest.map_or(d, |l| l.max(d))))
        })
    }
}

/// Whether the extension names an ISO BMFF container this parser understands
pub fn is_iso_bmff(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map_or(false, |ext| matches!(ext.as_str(), "mp4" | "m4v" | "mov" | "3gp" | "3g2"))
}

/// Read container metadata from a file. Blocking.
pub fn read_metadata(path: &Path) -> MediaResult<Mp4Metadata> {
    let mut reader = BufReader::new(File::open(path)?);
    let moov = find_moov(&mut reader)?;
    parse_moov(&moov)
}

/// Walk the top-level boxes and return the `moov` payload
fn find_moov<R: Read + Seek>(reader: &mut R) -> MediaResult<Vec<u8>> {
    loop {
        let mut header = [0u8; 8];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                return Err(MediaError::Container("no moov box found".to_string()));
            }
            Err(e) => return Err(e.into()),
        }

        let size32 = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let kind = [header[4], header[5], header[6], header[7]];

        let payload_len = match size32 {
            // Box extends to the end of the file
            0 => None,
            1 => {
                let mut large = [0u8; 8];
                reader.read_exact(&mut large)?;
                let size = u64::from_be_bytes(large);
                Some(size.checked_sub(16).ok_or_else(|| invalid_size(&kind))?)
            }
            n => Some(n.checked_sub(8).ok_or_else(|| invalid_size(&kind))?),
        };

        if &kind == b"moov" {
            let mut moov = Vec::new();
            match payload_len {
                Some(len) if len > MAX_MOOV_SIZE => {
                    return Err(MediaError::Container(format!("moov box too large: {} bytes", len)));
                }
                Some(len) => {
                    moov.resize(len as usize, 0);
                    reader.read_exact(&mut moov)?;
                }
                None => {
                    (&mut *reader).take(MAX_MOOV_SIZE).read_to_end(&mut moov)?;
                }
            }
            return Ok(moov);
        }

        match payload_len {
            Some(len) => {
                let offset = i64::try_from(len).map_err(|_| invalid_size(&kind))?;
                reader.seek(SeekFrom::Current(offset))?;
            }
            None => return Err(MediaError::Container("no moov box found".to_string())),
        }
    }
}

fn invalid_size(kind: &[u8; 4]) -> MediaError {
    MediaError::Container(format!("invalid size for box '{}'", String::from_utf8_lossy(kind)))
}

/// Split an in-memory buffer into its child boxes
fn children(data: &[u8]) -> MediaResult<Vec<([u8; 4], &[u8])>> {
    let mut boxes = Vec::new();
    let mut offset = 0usize;

    while offset + 8 <= data.len() {
        let size32 = read_u32(data, offset)? as usize;
        let kind = [data[offset + 4], data[offset + 5], data[offset + 6], data[offset + 7]];

        let (size, header_len) = match size32 {
            0 => (data.len() - offset, 8),
            1 => {
                let large = read_u64(data, offset + 8)?;
                (usize::try_from(large).map_err(|_| invalid_size(&kind))?, 16)
            }
            n => (n, 8),
        };

        let end = offset
            .checked_add(size)
            .filter(|end| size >= header_len && *end <= data.len())
            .ok_or_else(|| invalid_size(&kind))?;

        boxes.push((kind, &data[offset + header_len..end]));
        offset = end;
    }

    Ok(boxes)
}

fn read_u32(data: &[u8], offset: usize) -> MediaResult<u32> {
    data.get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| MediaError::Container("truncated box".to_string()))
}

fn read_u64(data: &[u8], offset: usize) -> MediaResult<u64> {
    data.get(offset..offset + 8)
        .map(|b| u64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]))
        .ok_or_else(|| MediaError::Container("truncated box".to_string()))
}

/// Duration in seconds from an `mvhd` or `mdhd` payload, which share their layout
fn read_time_header(payload: &[u8]) -> MediaResult<Option<f64>> {
    let version = *payload
        .first()
        .ok_or_else(|| MediaError::Container("empty time header".to_string()))?;

    let (timescale, duration) = if version == 1 {
        let duration = read_u64(payload, 24)?;
        (read_u32(payload, 20)?, (duration != u64::MAX).then_some(duration))
    } else {
        let duration = read_u32(payload, 16)?;
        (read_u32(payload, 12)?, (duration != u32::MAX).then_some(duration as u64))
    };

    Ok(match duration {
        Some(d) if timescale > 0 && d > 0 => Some(d as f64 / timescale as f64),
        _ => None,
    })
}

fn fixed_16_16(value: u32) -> f64 {
    value as f64 / 65536.0
}

fn parse_trak(trak: &[u8]) -> MediaResult<TrackInfo> {
    let mut track = TrackInfo {
        track_id: 0,
        handler: [0; 4],
        width: 0.0,
        height: 0.0,
        duration_secs: None,
    };

    for (kind, payload) in children(trak)? {
        match &kind {
            b"tkhd" => {
                let version = payload.first().copied().unwrap_or(0);
                let (id_offset, size_offset) = if version == 1 { (20, 88) } else { (12, 76) };
                track.track_id = read_u32(payload, id_offset)?;
                track.width = fixed_16_16(read_u32(payload, size_offset)?);
                track.height = fixed_16_16(read_u32(payload, size_offset + 4)?);
            }
            b"mdia" => {
                for (child, body) in children(payload)? {
                    match &child {
                        b"hdlr" => {
                            let handler = body
                                .get(8..12)
                                .ok_or_else(|| MediaError::Container("truncated hdlr".to_string()))?;
                            track.handler.copy_from_slice(handler);
                        }
                        b"mdhd" => track.duration_secs = read_time_header(body)?,
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    Ok(track)
}

/// Parse the payload of a `moov` box
pub fn parse_moov(moov: &[u8]) -> MediaResult<Mp4Metadata> {
    let mut metadata = Mp4Metadata::default();

    for (kind, payload) in children(moov)? {
        match &kind {
            b"mvhd" => metadata.duration_secs = read_time_header(payload)?,
            b"trak" => metadata.tracks.push(parse_trak(payload)?),
            _ => {}
        }
    }

    Ok(metadata)
}
