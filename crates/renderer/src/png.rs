//! PNG output for colormapped tiles.
//!
//! A colormapped tile draws from at most a 256-entry lookup table plus the
//! transparent nodata color, so it nearly always fits a PNG palette. Such
//! tiles are written indexed (color type 3); anything with more colors, such
//! as `rgb` tiles, falls back to 8-bit RGBA (color type 6).

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::{RenderError, Result};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const MAX_PALETTE: usize = 256;

/// IHDR color type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColorKind {
    Indexed = 3,
    Rgba = 6,
}

/// Distinct colors of a tile and the palette index of every pixel.
#[derive(Debug)]
struct TilePalette {
    entries: Vec<[u8; 4]>,
    indices: Vec<u8>,
}

impl TilePalette {
    /// `None` once a 257th distinct color shows up.
    fn from_rgba(rgba: &[u8]) -> Option<Self> {
        let mut lookup: HashMap<[u8; 4], u8> = HashMap::with_capacity(MAX_PALETTE);
        let mut entries = Vec::with_capacity(MAX_PALETTE);
        let mut indices = Vec::with_capacity(rgba.len() / 4);

        for px in rgba.chunks_exact(4) {
            let color = [px[0], px[1], px[2], px[3]];
            let index = match lookup.get(&color) {
                Some(&i) => i,
                None if entries.len() == MAX_PALETTE => return None,
                None => {
                    let i = entries.len() as u8;
                    entries.push(color);
                    lookup.insert(color, i);
                    i
                }
            };
            indices.push(index);
        }

        Some(Self { entries, indices })
    }

    fn plte(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|c| [c[0], c[1], c[2]]).collect()
    }

    /// Alpha per entry, cut after the last non-opaque one. `None` when every
    /// entry is opaque.
    fn trns(&self) -> Option<Vec<u8>> {
        let last = self.entries.iter().rposition(|c| c[3] < 255)?;
        Some(self.entries[..=last].iter().map(|c| c[3]).collect())
    }
}

/// Encode a `width`×`height` RGBA tile, indexed when its colors fit a palette.
pub fn encode_png(rgba: &[u8], width: usize, height: usize) -> Result<Vec<u8>> {
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(RenderError::SizeMismatch {
            expected,
            actual: rgba.len(),
        });
    }

    let mut png = SIGNATURE.to_vec();
    match TilePalette::from_rgba(rgba) {
        Some(palette) => {
            write_chunk(&mut png, b"IHDR", &header(width, height, ColorKind::Indexed));
            write_chunk(&mut png, b"PLTE", &palette.plte());
            if let Some(trns) = palette.trns() {
                write_chunk(&mut png, b"tRNS", &trns);
            }
            write_chunk(&mut png, b"IDAT", &compress_rows(&palette.indices, width)?);
        }
        None => {
            write_chunk(&mut png, b"IHDR", &header(width, height, ColorKind::Rgba));
            write_chunk(&mut png, b"IDAT", &compress_rows(rgba, width * 4)?);
        }
    }
    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

fn header(width: usize, height: usize, kind: ColorKind) -> [u8; 13] {
    let mut ihdr = [0u8; 13];
    ihdr[0..4].copy_from_slice(&(width as u32).to_be_bytes());
    ihdr[4..8].copy_from_slice(&(height as u32).to_be_bytes());
    ihdr[8] = 8; // bit depth
    ihdr[9] = kind as u8;
    // compression, filter and interlace methods stay 0
    ihdr
}

fn write_chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(kind);
    png.extend_from_slice(data);

    let mut crc = crc32fast::Hasher::new();
    crc.update(kind);
    crc.update(data);
    png.extend_from_slice(&crc.finalize().to_be_bytes());
}

/// Zlib stream of the scanlines, each prefixed with filter type 0 (none).
fn compress_rows(data: &[u8], row_bytes: usize) -> Result<Vec<u8>> {
    let compress_err = |e: std::io::Error| RenderError::Encode(format!("IDAT compression failed: {}", e));

    let mut zlib = ZlibEncoder::new(Vec::new(), Compression::fast());
    for row in data.chunks_exact(row_bytes.max(1)) {
        zlib.write_all(&[0]).map_err(compress_err)?;
        zlib.write_all(row).map_err(compress_err)?;
    }
    zlib.finish().map_err(compress_err)
}
