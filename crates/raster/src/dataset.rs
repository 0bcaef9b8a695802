//! The raster access seam.
//!
//! A [`RasterDataset`] is an open, request-scoped handle on one raster; a
//! [`RasterOpener`] resolves storage paths to handles. Band indices are
//! 1-based throughout, and band data is always exposed as `f64` in row-major
//! order regardless of the stored sample type.

use crate::{RasterError, Result};

/// Band sample type, identified by its GDAL numeric type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Byte,
    UInt16,
    Int16,
    UInt32,
    Int32,
    Float32,
    Float64,
    UInt64,
    Int64,
    Int8,
}

impl DataType {
    /// GDAL type code, as stored in layer metadata.
    pub fn gdal_code(self) -> u32 {
        match self {
            DataType::Byte => 1,
            DataType::UInt16 => 2,
            DataType::Int16 => 3,
            DataType::UInt32 => 4,
            DataType::Int32 => 5,
            DataType::Float32 => 6,
            DataType::Float64 => 7,
            DataType::UInt64 => 12,
            DataType::Int64 => 13,
            DataType::Int8 => 14,
        }
    }

    pub fn from_gdal_code(code: u32) -> Option<Self> {
        Some(match code {
            1 => DataType::Byte,
            2 => DataType::UInt16,
            3 => DataType::Int16,
            4 => DataType::UInt32,
            5 => DataType::Int32,
            6 => DataType::Float32,
            7 => DataType::Float64,
            12 => DataType::UInt64,
            13 => DataType::Int64,
            14 => DataType::Int8,
            _ => return None,
        })
    }

    /// GDAL type name.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Byte => "Byte",
            DataType::UInt16 => "UInt16",
            DataType::Int16 => "Int16",
            DataType::UInt32 => "UInt32",
            DataType::Int32 => "Int32",
            DataType::Float32 => "Float32",
            DataType::Float64 => "Float64",
            DataType::UInt64 => "UInt64",
            DataType::Int64 => "Int64",
            DataType::Int8 => "Int8",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, DataType::Float32 | DataType::Float64)
    }

    /// Representable range of an integer type.
    fn integer_range(self) -> Option<(f64, f64)> {
        match self {
            DataType::Byte => Some((u8::MIN as f64, u8::MAX as f64)),
            DataType::UInt16 => Some((u16::MIN as f64, u16::MAX as f64)),
            DataType::Int16 => Some((i16::MIN as f64, i16::MAX as f64)),
            DataType::UInt32 => Some((u32::MIN as f64, u32::MAX as f64)),
            DataType::Int32 => Some((i32::MIN as f64, i32::MAX as f64)),
            DataType::UInt64 => Some((u64::MIN as f64, u64::MAX as f64)),
            DataType::Int64 => Some((i64::MIN as f64, i64::MAX as f64)),
            DataType::Int8 => Some((i8::MIN as f64, i8::MAX as f64)),
            DataType::Float32 | DataType::Float64 => None,
        }
    }

    /// Convert a value as if it were stored in a band of this type.
    ///
    /// Integer types round to nearest and saturate; NaN becomes 0.
    pub fn cast(self, value: f64) -> f64 {
        match self {
            DataType::Float64 => value,
            DataType::Float32 => value as f32 as f64,
            _ => {
                if value.is_nan() {
                    return 0.0;
                }
                let (lo, hi) = self.integer_range().unwrap_or((f64::MIN, f64::MAX));
                value.round().clamp(lo, hi)
            }
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Affine pixel-to-world transform in GDAL order:
/// `[origin_x, pixel_width, row_rotation, origin_y, column_rotation, pixel_height]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform(pub [f64; 6]);

impl GeoTransform {
    /// North-up transform with the given origin and pixel size.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self([origin_x, pixel_width, 0.0, origin_y, 0.0, pixel_height])
    }

    pub fn origin(&self) -> (f64, f64) {
        (self.0[0], self.0[3])
    }

    pub fn pixel_size(&self) -> (f64, f64) {
        (self.0[1], self.0[5])
    }

    /// World coordinate of a (fractional) pixel position.
    pub fn pixel_to_geo(&self, col: f64, row: f64) -> (f64, f64) {
        let g = &self.0;
        (
            g[0] + col * g[1] + row * g[2],
            g[3] + col * g[4] + row * g[5],
        )
    }

    /// Fractional pixel position of a world coordinate, `None` for a
    /// degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let g = &self.0;
        let det = g[1] * g[5] - g[2] * g[4];
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let dx = x - g[0];
        let dy = y - g[3];
        let col = (dx * g[5] - dy * g[2]) / det;
        let row = (dy * g[1] - dx * g[4]) / det;
        Some((col, row))
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }
}

/// An open raster.
pub trait RasterDataset {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    fn band_count(&self) -> usize;

    fn geotransform(&self) -> GeoTransform;

    /// Projection definition text (WKT, proj4 or `EPSG:n`).
    fn projection(&self) -> &str;

    fn band_datatype(&self, band: usize) -> Result<DataType>;

    fn band_nodata(&self, band: usize) -> Result<Option<f64>>;

    /// Full band contents, row-major.
    fn read_band(&self, band: usize) -> Result<Vec<f64>>;

    /// Values of the given row-major cells. Backends that keep bands in
    /// memory override this to avoid copying the whole band.
    fn read_cells(&self, band: usize, cells: &[usize]) -> Result<Vec<f64>> {
        pick_cells(&self.read_band(band)?, cells)
    }

    /// Fail unless `band` is a valid 1-based band index.
    fn check_band(&self, band: usize) -> Result<()> {
        let count = self.band_count();
        if band == 0 || band > count {
            return Err(RasterError::BandOutOfRange { band, count });
        }
        Ok(())
    }
}

/// Gather `cells` out of a row-major band.
pub(crate) fn pick_cells(values: &[f64], cells: &[usize]) -> Result<Vec<f64>> {
    cells
        .iter()
        .map(|&i| {
            values.get(i).copied().ok_or_else(|| {
                RasterError::read_failed(format!("cell {} outside a {}-cell band", i, values.len()))
            })
        })
        .collect()
}

/// Resolves storage paths to open rasters.
pub trait RasterOpener: Send + Sync {
    fn open(&self, path: &str) -> Result<Box<dyn RasterDataset + Send>>;

    /// A token that changes when the file behind `path` is replaced, if the
    /// backend can provide one.
    fn fingerprint(&self, _path: &str) -> Result<Option<String>> {
        Ok(None)
    }
}
