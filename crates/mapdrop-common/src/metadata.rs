//! Derived raster metadata, as stored in the metadata cache.

use serde::{Deserialize, Serialize};

/// Number of percentile steps kept per band (0, 5, ..., 100).
pub const PERCENTILE_STEPS: usize = 21;

/// Summary statistics of one band over its unmasked cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Percentiles at 0%, 5%, ..., 100%.
    #[serde(alias = "q")]
    pub percentiles: Vec<f64>,
}

impl BandStats {
    /// Look up a symbolic statistic (`min`, `max` or `avg`).
    pub fn lookup(&self, name: &str) -> Option<f64> {
        match name {
            "min" => Some(self.min),
            "max" => Some(self.max),
            "avg" => Some(self.avg),
            _ => None,
        }
    }
}

/// Per-band metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    /// GDAL numeric data type code of the band.
    pub datatype: u32,
    pub nodata: Option<f64>,
    /// `b1`, `b2`, ...
    pub name: String,
    /// `None` when every cell of the band is nodata.
    pub stats: Option<BandStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Raster,
}

/// Everything derived from a raster file that tile rendering and clients need.
///
/// Immutable once computed; identified by the raster's storage path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterMetadata {
    /// Native projection definition text.
    pub crs: String,
    pub epsg: Option<u32>,
    pub geotransform: [f64; 6],
    pub width: usize,
    pub height: usize,
    pub layers: Vec<LayerMetadata>,
    /// Footprint polygon in WGS84 lon/lat, as WKT.
    pub extent: String,
    /// Bounding box of `extent`, as WKT.
    pub envelope: String,
    #[serde(rename = "type")]
    pub kind: DatasetKind,
}

impl RasterMetadata {
    /// Metadata of the first band, which drives tile rendering.
    pub fn primary_layer(&self) -> Option<&LayerMetadata> {
        self.layers.first()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
