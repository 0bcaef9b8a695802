//! Colormap engine: turns band values into RGBA pixels.
//!
//! Four modes are supported:
//! - **discrete**: values are binned between range boundaries and each bin
//!   takes an evenly spread color of a 256-entry table.
//! - **linear**: values are normalized between the first and last range and
//!   looked up in a 256-entry table.
//! - **exact**: categorical; a value equal to the n-th range takes the n-th
//!   palette color, anything else is transparent.
//! - **rgb**: the first three bands are used directly as red, green and blue.
//!
//! Masked cells are fully transparent in every mode except `rgb`.

use std::fmt;
use std::str::FromStr;

use mapdrop_common::BandStats;
use raster::DataType;
use rayon::prelude::*;
use tracing::debug;

use crate::buffer::PixelBuffer;
use crate::color::Color;
use crate::error::{RenderError, Result};
use crate::palette::{fallback_lut, gradient_lut, named_lut, FALLBACK_PALETTE, LUT_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Discrete,
    Linear,
    Exact,
    Rgb,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Discrete => "discrete",
            Mode::Linear => "linear",
            Mode::Exact => "exact",
            Mode::Rgb => "rgb",
        }
    }
}

impl FromStr for Mode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discrete" => Ok(Mode::Discrete),
            "linear" => Ok(Mode::Linear),
            "exact" => Ok(Mode::Exact),
            "rgb" => Ok(Mode::Rgb),
            _ => Err(RenderError::UnsupportedMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the rendering mode for a raster with `band_count` bands.
///
/// Single-band rasters use the requested mode, `linear` by default, and
/// cannot be rendered as `rgb`. Three-band rasters always render as `rgb`.
/// Other band counts are not renderable.
pub fn resolve_mode(requested: Option<&str>, band_count: usize) -> Result<Mode> {
    match band_count {
        1 => {
            let mode = match requested.map(str::trim).filter(|m| !m.is_empty()) {
                Some(m) => m.parse()?,
                None => Mode::Linear,
            };
            if mode == Mode::Rgb {
                return Err(RenderError::UnsupportedMode(
                    "rgb requires a 3-band raster".to_string(),
                ));
            }
            Ok(mode)
        }
        3 => {
            if let Some(m) = requested {
                if m.trim().to_ascii_lowercase() != "rgb" {
                    debug!(requested = m, "3-band raster, rendering as rgb");
                }
            }
            Ok(Mode::Rgb)
        }
        n => Err(RenderError::UnsupportedMode(format!(
            "cannot render a raster with {} bands",
            n
        ))),
    }
}

/// Outcome of resolving one token of a range list.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeToken {
    Value(f64),
    Skipped { token: String, reason: String },
}

/// Resolve a comma-separated range list.
///
/// `min`, `max` and `avg` read from `stats`; other tokens parse as numbers.
pub fn parse_ranges(text: &str, stats: Option<&BandStats>) -> Vec<RangeToken> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|token| resolve_token(token, stats))
        .collect()
}

fn resolve_token(token: &str, stats: Option<&BandStats>) -> RangeToken {
    let skipped = |reason: &str| RangeToken::Skipped {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    match token {
        "min" | "max" | "avg" => match stats.and_then(|s| s.lookup(token)) {
            Some(v) => RangeToken::Value(v),
            None => skipped("band has no statistics"),
        },
        _ => match token.parse::<f64>() {
            Ok(v) if v.is_finite() => RangeToken::Value(v),
            Ok(_) => skipped("not a finite number"),
            Err(_) => skipped("not a number"),
        },
    }
}

/// Values of the resolved tokens, logging the skipped ones.
pub fn range_values(tokens: &[RangeToken]) -> Vec<f64> {
    tokens
        .iter()
        .filter_map(|t| match t {
            RangeToken::Value(v) => Some(*v),
            RangeToken::Skipped { token, reason } => {
                debug!(token = %token, reason = %reason, "Skipping range token");
                None
            }
        })
        .collect()
}

/// Requested styling of a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct ColormapSpec {
    pub mode: Mode,
    /// Palette name or comma-separated color literals.
    pub colormap: String,
    /// Comma-separated range tokens.
    pub ranges: String,
}

impl ColormapSpec {
    pub fn new(mode: Mode, colormap: impl Into<String>, ranges: impl Into<String>) -> Self {
        Self {
            mode,
            colormap: colormap.into(),
            ranges: ranges.into(),
        }
    }
}

/// Colors resolved from a colormap string.
#[derive(Debug, Clone, PartialEq)]
enum ColorSource {
    /// 256-entry table.
    Table(Vec<Color>),
    /// Exactly the colors listed.
    Listed(Vec<Color>),
}

impl ColorSource {
    fn resolve(colormap: &str, mode: Mode) -> Self {
        let colormap = colormap.trim();
        if let Some(lut) = named_lut(colormap) {
            return ColorSource::Table(lut);
        }

        let literals: Option<Vec<Color>> = colormap.split(',').map(Color::parse).collect();
        match literals {
            Some(colors) if mode == Mode::Exact && !colors.is_empty() => {
                return ColorSource::Listed(colors)
            }
            Some(colors) if colors.len() >= 2 => return ColorSource::Table(gradient_lut(&colors)),
            _ => {}
        }

        debug!(
            colormap = colormap,
            fallback = FALLBACK_PALETTE,
            "Unresolved colormap, using fallback palette"
        );
        ColorSource::Table(fallback_lut())
    }

    fn colors(&self) -> &[Color] {
        match self {
            ColorSource::Table(c) | ColorSource::Listed(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Lookup {
    Linear {
        lut: Vec<Color>,
        vmin: f64,
        vmax: f64,
    },
    Discrete {
        lut: Vec<Color>,
        boundaries: Vec<f64>,
    },
    Exact {
        palette: Vec<Color>,
        values: Vec<f64>,
    },
    Rgb,
}

/// A ready-to-apply colormap.
#[derive(Debug, Clone, PartialEq)]
pub struct Colormap {
    mode: Mode,
    lookup: Lookup,
}

impl Colormap {
    /// Resolve ranges against `stats` and build the lookup for `spec.mode`.
    ///
    /// `linear` and `discrete` need at least two resolved ranges, `exact` at
    /// least one. `discrete` boundaries must be strictly increasing and
    /// `linear` needs its first range at or below its last.
    pub fn build(spec: &ColormapSpec, stats: Option<&BandStats>) -> Result<Self> {
        if spec.mode == Mode::Rgb {
            return Ok(Self {
                mode: Mode::Rgb,
                lookup: Lookup::Rgb,
            });
        }

        let values = range_values(&parse_ranges(&spec.ranges, stats));
        let source = ColorSource::resolve(&spec.colormap, spec.mode);

        let lookup = match spec.mode {
            Mode::Linear => {
                let (vmin, vmax) = match (values.first(), values.last()) {
                    (Some(&lo), Some(&hi)) if values.len() >= 2 => (lo, hi),
                    _ => return Err(too_few(spec.mode, 2, values.len())),
                };
                if vmin > vmax {
                    return Err(RenderError::InvalidRanges(format!(
                        "linear range {} > {}",
                        vmin, vmax
                    )));
                }
                Lookup::Linear {
                    lut: source.colors().to_vec(),
                    vmin,
                    vmax,
                }
            }
            Mode::Discrete => {
                if values.len() < 2 {
                    return Err(too_few(spec.mode, 2, values.len()));
                }
                if values.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(RenderError::InvalidRanges(
                        "discrete boundaries must increase monotonically".to_string(),
                    ));
                }
                Lookup::Discrete {
                    lut: source.colors().to_vec(),
                    boundaries: values,
                }
            }
            Mode::Exact => {
                if values.is_empty() {
                    return Err(too_few(spec.mode, 1, 0));
                }
                Lookup::Exact {
                    palette: source.colors().to_vec(),
                    values,
                }
            }
            Mode::Rgb => Lookup::Rgb,
        };

        Ok(Self {
            mode: spec.mode,
            lookup,
        })
    }

    /// Round `exact` category values to the precision of Float32 bands, so a
    /// literal such as `0.1` matches the stored sample.
    pub fn with_datatype(mut self, datatype: DataType) -> Self {
        if let (Lookup::Exact { values, .. }, DataType::Float32) = (&mut self.lookup, datatype) {
            for value in values.iter_mut() {
                *value = datatype.cast(*value);
            }
        }
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Color one cell value of the first band.
    pub fn color_for(&self, value: f64) -> Color {
        if value.is_nan() {
            return Color::transparent();
        }
        match &self.lookup {
            Lookup::Linear { lut, vmin, vmax } => linear_color(lut, *vmin, *vmax, value),
            Lookup::Discrete { lut, boundaries } => discrete_color(lut, boundaries, value),
            Lookup::Exact { palette, values } => exact_color(palette, values, value),
            Lookup::Rgb => Color::transparent(),
        }
    }

    /// Color every cell of `buffer`, returning row-major RGBA bytes.
    pub fn apply(&self, buffer: &PixelBuffer) -> Result<Vec<u8>> {
        let mut out = vec![0u8; buffer.len() * 4];

        if self.mode == Mode::Rgb {
            let (r, g, b) = match (buffer.band(0), buffer.band(1), buffer.band(2)) {
                (Some(r), Some(g), Some(b)) => (r, g, b),
                _ => {
                    return Err(RenderError::UnsupportedMode(format!(
                        "rgb needs 3 bands, got {}",
                        buffer.band_count()
                    )))
                }
            };
            out.par_chunks_mut(4).enumerate().for_each(|(i, px)| {
                px.copy_from_slice(&[to_byte(r[i]), to_byte(g[i]), to_byte(b[i]), 255]);
            });
            return Ok(out);
        }

        let (values, mask) = match (buffer.band(0), buffer.mask(0)) {
            (Some(v), Some(m)) => (v, m),
            _ => {
                return Err(RenderError::UnsupportedMode(format!(
                    "{} needs a band to color",
                    self.mode
                )))
            }
        };
        out.par_chunks_mut(4).enumerate().for_each(|(i, px)| {
            let color = if mask[i] {
                Color::transparent()
            } else {
                self.color_for(values[i])
            };
            px.copy_from_slice(&color.to_array());
        });
        Ok(out)
    }
}

fn too_few(mode: Mode, needed: usize, got: usize) -> RenderError {
    RenderError::InvalidRanges(format!(
        "{} mode needs at least {} range value(s), got {}",
        mode, needed, got
    ))
}

fn to_byte(v: f64) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.clamp(0.0, 255.0) as u8
    }
}

fn lut_index(lut: &[Color], idx: isize) -> Color {
    if lut.is_empty() {
        return Color::transparent();
    }
    lut[idx.clamp(0, lut.len() as isize - 1) as usize]
}

fn linear_color(lut: &[Color], vmin: f64, vmax: f64, value: f64) -> Color {
    if vmin == vmax {
        return lut_index(lut, 0);
    }
    let norm = (value - vmin) / (vmax - vmin);
    lut_index(lut, (norm * lut.len() as f64).floor() as isize)
}

fn discrete_color(lut: &[Color], boundaries: &[f64], value: f64) -> Color {
    let last = boundaries.len() - 1;
    if value < boundaries[0] {
        return lut_index(lut, 0);
    }
    if value >= boundaries[last] {
        return lut_index(lut, LUT_SIZE as isize - 1);
    }

    let bin = boundaries.iter().filter(|b| **b <= value).count() - 1;
    let regions = last;
    let idx = if regions == 1 {
        (LUT_SIZE - 1) / 2
    } else {
        ((LUT_SIZE - 1) as f64 / (regions - 1) as f64 * bin as f64) as usize
    };
    lut_index(lut, idx as isize)
}

fn exact_color(palette: &[Color], values: &[f64], value: f64) -> Color {
    match values.iter().position(|v| *v == value) {
        Some(n) => lut_index(palette, n as isize),
        None => Color::transparent(),
    }
}
