//! Still frame capture.
//!
//! Camera endpoints are either single JPEG snapshots or endless MJPEG
//! `multipart/x-mixed-replace` streams. Both are read the same way: chunks are
//! accumulated until the first complete JPEG (`FFD8 .. FFD9`) is buffered.

use std::ops::Range;
use std::path::Path;

use image::ImageFormat;
use reqwest::Client;
use tracing::debug;

use crate::request::check_status;
use crate::{Error, Result};

const SOI: [u8; 2] = [0xFF, 0xD8];
const EOI: [u8; 2] = [0xFF, 0xD9];
const SOS: u8 = 0xDA;

/// Returns the first complete JPEG image in `bytes`, if any.
pub fn extract_jpeg(bytes: &[u8]) -> Option<&[u8]> {
    FrameScanner::default().scan(bytes).map(|r| &bytes[r])
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Offset of the entropy coded data of the image starting at `soi`.
///
/// Header segments (APPn, DQT, DHT, SOF, COM, ...) carry their length, so an
/// EXIF thumbnail inside APP1 is jumped over with its own `FFD9`.
/// `None` while the headers are not fully buffered yet.
fn scan_start(bytes: &[u8], soi: usize) -> Option<usize> {
    let mut pos = soi + SOI.len();
    loop {
        if *bytes.get(pos)? != 0xFF {
            // Not a marker, fall back to a plain search from here.
            return Some(pos);
        }
        let marker = *bytes.get(pos + 1)?;
        match marker {
            // fill byte
            0xFF => pos += 1,
            0x01 | 0xD0..=0xD7 => pos += 2,
            0xD9 => return Some(pos),
            _ => {
                let len = u16::from_be_bytes([*bytes.get(pos + 2)?, *bytes.get(pos + 3)?]) as usize;
                pos += 2 + len;
                if marker == SOS {
                    return Some(pos);
                }
            }
        }
    }
}

/// Finds the first frame in a buffer that grows between calls, without
/// rescanning bytes it has already looked at.
#[derive(Debug, Default)]
struct FrameScanner {
    soi: Option<usize>,
    body: Option<usize>,
    checked: usize,
}

impl FrameScanner {
    fn scan(&mut self, buf: &[u8]) -> Option<Range<usize>> {
        let soi = match self.soi {
            Some(soi) => soi,
            None => match find(buf, &SOI, self.checked.saturating_sub(1)) {
                Some(soi) => *self.soi.insert(soi),
                None => {
                    self.checked = buf.len();
                    return None;
                }
            },
        };
        let body = match self.body {
            Some(body) => body,
            None => {
                let body = scan_start(buf, soi)?;
                self.checked = body;
                *self.body.insert(body)
            }
        };
        match find(buf, &EOI, self.checked.saturating_sub(1).max(body)) {
            Some(end) => Some(soi..end + EOI.len()),
            None => {
                self.checked = buf.len();
                None
            }
        }
    }
}

/// Reads from `url` until one JPEG frame is available and returns its bytes.
/// Stops reading once `max_bytes` have been buffered.
pub async fn capture_frame(client: &Client, url: &str, max_bytes: usize) -> Result<Vec<u8>> {
    let res = client.get(url).send().await?;
    let mut res = check_status(res, url)?;

    let mut buf = Vec::with_capacity(64 * 1024);
    let mut scanner = FrameScanner::default();
    while let Some(chunk) = res.chunk().await? {
        buf.extend_from_slice(&chunk);
        if let Some(frame) = scanner.scan(&buf) {
            debug!("Frame of {} bytes from {url}", frame.len());
            buf.truncate(frame.end);
            buf.drain(..frame.start);
            return Ok(buf);
        }
        if buf.len() >= max_bytes {
            break;
        }
    }
    Err(Error::NoFrame(url.to_string()))
}

/// Decodes the frame and writes it as a JPEG to `path`, creating missing directories.
pub async fn write_frame(frame: Vec<u8>, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let img = image::load_from_memory_with_format(&frame, ImageFormat::Jpeg)?;
        img.to_rgb8().save_with_format(&path, ImageFormat::Jpeg)?;
        Ok(())
    })
    .await??;
    Ok(())
}
