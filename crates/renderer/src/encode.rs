//! Output formats for rendered tiles.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use jpeg_encoder::{ColorType, Encoder};

use crate::error::{RenderError, Result};
use crate::png::encode_png;

/// JPEG quality used when the request gives none.
pub const DEFAULT_QUALITY: u8 = 75;

const DATA_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    /// PNG wrapped in a `data:` URI.
    Base64,
}

impl OutputFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Base64 => "application/base64",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Base64 => "base64",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpeg" => Ok(OutputFormat::Jpeg),
            "base64" => Ok(OutputFormat::Base64),
            _ => Err(RenderError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encode RGBA pixels. `quality` only affects JPEG and is clamped to 1..=100.
pub fn encode_rgba(
    rgba: &[u8],
    width: usize,
    height: usize,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Png => encode_png(rgba, width, height),
        OutputFormat::Jpeg => encode_jpeg(rgba, width, height, quality),
        OutputFormat::Base64 => {
            let png = encode_png(rgba, width, height)?;
            let mut uri = String::with_capacity(DATA_URI_PREFIX.len() + png.len() * 4 / 3 + 4);
            uri.push_str(DATA_URI_PREFIX);
            STANDARD.encode_string(&png, &mut uri);
            Ok(uri.into_bytes())
        }
    }
}

/// Progressive JPEG with optimized Huffman tables. JPEG has no alpha
/// channel; alpha is dropped, not composited.
fn encode_jpeg(rgba: &[u8], width: usize, height: usize, quality: u8) -> Result<Vec<u8>> {
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(RenderError::SizeMismatch {
            expected,
            actual: rgba.len(),
        });
    }
    let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => {
            return Err(RenderError::Encode(format!(
                "{}x{} exceeds the JPEG size limit",
                width, height
            )))
        }
    };

    let rgb: Vec<u8> = rgba
        .chunks_exact(4)
        .flat_map(|px| [px[0], px[1], px[2]])
        .collect();

    let mut jpeg_data = Vec::new();
    let mut encoder = Encoder::new(&mut jpeg_data, quality.clamp(1, 100));
    encoder.set_progressive(true);
    encoder.set_optimized_huffman_tables(true);
    encoder
        .encode(&rgb, w, h, ColorType::Rgb)
        .map_err(|e| RenderError::Encode(format!("JPEG encoding failed: {}", e)))?;

    Ok(jpeg_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noisy(width: usize, height: usize) -> Vec<u8> {
        (0..width * height)
            .flat_map(|i| {
                let v = ((i * 7919) % 251) as u8;
                [v, v.wrapping_mul(3), 255 - v, 255]
            })
            .collect()
    }

    #[test]
    fn test_format_names() {
        assert_eq!("PNG".parse::<OutputFormat>().unwrap(), OutputFormat::Png);
        assert_eq!("Jpeg".parse::<OutputFormat>().unwrap(), OutputFormat::Jpeg);
        assert_eq!("base64".parse::<OutputFormat>().unwrap(), OutputFormat::Base64);
        assert!(matches!(
            "gif".parse::<OutputFormat>(),
            Err(RenderError::UnsupportedFormat(ref f)) if f == "gif"
        ));
        assert!("jpg".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(OutputFormat::Png.mime_type(), "image/png");
        assert_eq!(OutputFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Base64.mime_type(), "application/base64");
    }

    #[test]
    fn test_jpeg_signature() {
        let jpeg = encode_rgba(&noisy(16, 16), 16, 16, OutputFormat::Jpeg, 75).unwrap();
        assert_eq!(&jpeg[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_jpeg_is_progressive() {
        let jpeg = encode_rgba(&noisy(16, 16), 16, 16, OutputFormat::Jpeg, 75).unwrap();
        // SOF2 marks a progressive frame, SOF0 a baseline one
        assert!(jpeg.windows(2).any(|m| m == [0xFF, 0xC2]));
        assert!(!jpeg.windows(2).any(|m| m == [0xFF, 0xC0]));

        let img = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (16, 16));
    }

    #[test]
    fn test_jpeg_quality_clamped() {
        let zero = encode_rgba(&noisy(16, 16), 16, 16, OutputFormat::Jpeg, 0).unwrap();
        let one = encode_rgba(&noisy(16, 16), 16, 16, OutputFormat::Jpeg, 1).unwrap();
        assert_eq!(zero, one);
    }

    #[test]
    fn test_base64_is_data_uri_of_png() {
        let rgba = noisy(4, 4);
        let out = encode_rgba(&rgba, 4, 4, OutputFormat::Base64, 75).unwrap();
        let text = String::from_utf8(out).unwrap();
        let payload = text.strip_prefix("data:image/png;base64,").unwrap();
        let png = STANDARD.decode(payload).unwrap();
        assert_eq!(png, encode_png(&rgba, 4, 4).unwrap());
    }
}
