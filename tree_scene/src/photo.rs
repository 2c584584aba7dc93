//! Photo decoding and the loader → controller handoff.
//!
//! Loading (file read, HTTP fetch, decode) happens on whatever thread calls
//! [`PhotoLoader::load`]. Decoded textures travel over a channel and are
//! inserted into the registry on the controller's next tick, so the particle
//! set only ever changes on the frame thread.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

use glam::Vec2;

use crate::error::SceneError;

/// Remote photos larger than this are refused.
const MAX_FETCH_BYTES: u64 = 32 * 1024 * 1024;

pub const PLACEHOLDER_SIZE: u32 = 512;
const PLACEHOLDER_BG:     [u8; 3] = [0x05, 0x05, 0x05];
const PLACEHOLDER_BORDER: [u8; 3] = [0xee, 0xbb, 0x66];
/// Greeting lines and the top edge of each, in card pixels.
const PLACEHOLDER_LINES:  [(&str, u32); 2] = [("JOYEUX", 188), ("NOEL", 258)];
const CARD_GLYPH_SCALE:   u32 = 6;

// ════════════════════════════════════════════════════════════════════════════
// ImageSource
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Url(String),
    Bytes(Vec<u8>),
}

impl From<&str> for ImageSource {
    fn from(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            ImageSource::Url(s.to_string())
        } else {
            ImageSource::Path(PathBuf::from(s))
        }
    }
}

impl ImageSource {
    /// Stable key for the source; `None` for in-memory bytes.
    pub fn key(&self) -> Option<String> {
        match self {
            ImageSource::Path(p) => Some(p.display().to_string()),
            ImageSource::Url(u)  => Some(u.clone()),
            ImageSource::Bytes(_) => None,
        }
    }

    pub fn fetch(self) -> Result<Vec<u8>, SceneError> {
        match self {
            ImageSource::Bytes(b) => Ok(b),
            ImageSource::Path(path) => {
                fs::read(&path).map_err(|source| SceneError::Read { path, source })
            }
            ImageSource::Url(url) => {
                let response = ureq::get(&url).call().map_err(|e| SceneError::Fetch {
                    url:    url.clone(),
                    reason: e.to_string(),
                })?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .take(MAX_FETCH_BYTES)
                    .read_to_end(&mut bytes)
                    .map_err(|e| SceneError::Fetch { url, reason: e.to_string() })?;
                Ok(bytes)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// UvWindow
// ════════════════════════════════════════════════════════════════════════════

/// Centred square crop of a texture, as texture-space repeat and offset.
///
/// A wide image keeps its full height and the middle `1/aspect` of its width;
/// a tall image keeps its full width and the middle `aspect` of its height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UvWindow {
    pub repeat: Vec2,
    pub offset: Vec2,
}

impl Default for UvWindow {
    fn default() -> Self {
        UvWindow { repeat: Vec2::ONE, offset: Vec2::ZERO }
    }
}

impl UvWindow {
    /// `aspect` is width / height.
    pub fn for_aspect(aspect: f32) -> Self {
        if !(aspect.is_finite() && aspect > 0.0) {
            return UvWindow::default();
        }
        if aspect > 1.0 {
            let w = 1.0 / aspect;
            UvWindow { repeat: Vec2::new(w, 1.0), offset: Vec2::new((1.0 - w) / 2.0, 0.0) }
        } else if aspect < 1.0 {
            UvWindow { repeat: Vec2::new(1.0, aspect), offset: Vec2::new(0.0, (1.0 - aspect) / 2.0) }
        } else {
            UvWindow::default()
        }
    }

    /// Map frame coordinates in [0,1]² to texture coordinates.
    pub fn apply(&self, u: f32, v: f32) -> Vec2 {
        self.offset + Vec2::new(u, v) * self.repeat
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PhotoTexture
// ════════════════════════════════════════════════════════════════════════════

/// Decoded RGBA8 photo plus the crop it is displayed through.
#[derive(Clone, Debug, PartialEq)]
pub struct PhotoTexture {
    pub width:  u32,
    pub height: u32,
    pub rgba:   Vec<u8>,
    pub uv:     UvWindow,
}

impl PhotoTexture {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        let aspect = width as f32 / height.max(1) as f32;
        PhotoTexture { width, height, rgba, uv: UvWindow::for_aspect(aspect) }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SceneError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (w, h) = img.dimensions();
        Ok(PhotoTexture::from_rgba(w, h, img.into_raw()))
    }

    /// Dark card with an inset gold frame and a two-line greeting, shown
    /// until a real photo arrives.
    pub fn placeholder() -> Self {
        let size = PLACEHOLDER_SIZE;
        let (inset, half_line) = (20.0_f32, 7.5_f32);
        let (lo, hi) = (inset, size as f32 - inset);

        let mut rgba = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                let (fx, fy) = (x as f32 + 0.5, y as f32 + 0.5);
                let inside_outer = fx >= lo - half_line && fx <= hi + half_line
                                && fy >= lo - half_line && fy <= hi + half_line;
                let inside_inner = fx > lo + half_line && fx < hi - half_line
                                && fy > lo + half_line && fy < hi - half_line;
                let c = if inside_outer && !inside_inner { PLACEHOLDER_BORDER } else { PLACEHOLDER_BG };
                rgba.extend_from_slice(&[c[0], c[1], c[2], 0xFF]);
            }
        }
        for (text, top) in PLACEHOLDER_LINES {
            stamp_line(&mut rgba, size, text, top, PLACEHOLDER_BORDER);
        }
        PhotoTexture::from_rgba(size, size, rgba)
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Nearest-neighbour sample through the crop; `u`, `v` in [0,1]
    /// with `v` growing downwards. Returns packed `0xFFRRGGBB`.
    pub fn sample(&self, u: f32, v: f32) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0xFF000000;
        }
        let t  = self.uv.apply(u.clamp(0.0, 1.0), v.clamp(0.0, 1.0));
        let px = ((t.x * self.width as f32) as u32).min(self.width - 1);
        let py = ((t.y * self.height as f32) as u32).min(self.height - 1);
        let i  = ((py * self.width + px) * 4) as usize;
        match self.rgba.get(i..i + 3) {
            Some(&[r, g, b]) => 0xFF000000 | (r as u32) << 16 | (g as u32) << 8 | b as u32,
            _ => 0xFF000000,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Loader / inbox
// ════════════════════════════════════════════════════════════════════════════

/// Sending half of the photo handoff. Cheap to clone; safe to move to a
/// loader thread.
#[derive(Clone)]
pub struct PhotoLoader {
    tx: Sender<PhotoTexture>,
}

/// Receiving half, drained by the controller once per tick.
pub struct PhotoInbox {
    rx: Receiver<PhotoTexture>,
}

pub fn photo_channel() -> (PhotoLoader, PhotoInbox) {
    let (tx, rx) = channel();
    (PhotoLoader { tx }, PhotoInbox { rx })
}

impl PhotoLoader {
    /// Fetch and decode `source`, then queue it. Nothing is queued on error.
    pub fn load(&self, source: ImageSource) -> Result<(), SceneError> {
        let label = source.key().unwrap_or_else(|| "<bytes>".to_string());
        let texture = PhotoTexture::decode(&source.fetch()?)?;
        log::info!("[photo] loaded {} ({}x{})", label, texture.width, texture.height);
        self.submit(texture)
    }

    /// Queue an already-decoded texture.
    pub fn submit(&self, texture: PhotoTexture) -> Result<(), SceneError> {
        self.tx.send(texture).map_err(|_| SceneError::SceneClosed)
    }
}

impl PhotoInbox {
    /// Everything queued since the last call, in arrival order.
    pub fn drain(&self) -> Vec<PhotoTexture> {
        self.rx.try_iter().collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Card lettering
// ════════════════════════════════════════════════════════════════════════════

/// Draw `text` horizontally centred on a square `size`×`size` RGBA card.
/// Characters without a glyph leave a gap.
fn stamp_line(rgba: &mut [u8], size: u32, text: &str, top: u32, color: [u8; 3]) {
    let s       = CARD_GLYPH_SCALE;
    let advance = 6 * s;
    let width   = (text.chars().count() as u32 * advance).saturating_sub(s);
    let left    = size.saturating_sub(width) / 2;

    for (i, c) in text.chars().enumerate() {
        let x0 = left + i as u32 * advance;
        for (row, bits) in card_glyph(c).iter().enumerate() {
            for col in 0..5 {
                if bits & (0b10000 >> col) == 0 {
                    continue;
                }
                for dy in 0..s {
                    for dx in 0..s {
                        let (x, y) = (x0 + col * s + dx, top + row as u32 * s + dy);
                        if x >= size || y >= size {
                            continue;
                        }
                        let at = ((y * size + x) * 4) as usize;
                        rgba[at..at + 3].copy_from_slice(&color);
                    }
                }
            }
        }
    }
}

/// 5×7 capitals, one row per byte, leftmost column in bit 4.
fn card_glyph(c: char) -> [u8; 7] {
    match c {
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        _   => [0; 7],
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
