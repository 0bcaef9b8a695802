//! XYZ tile rendering: warp, mask, colormap, encode.

use std::time::Instant;

use mapdrop_common::{RasterMetadata, TileCoord, DEFAULT_TILE_SIZE};
use raster::{warp_tile, DataType, RasterDataset};
use tracing::{debug, info};

use crate::buffer::PixelBuffer;
use crate::colormap::{resolve_mode, Colormap, ColormapSpec};
use crate::encode::{encode_rgba, OutputFormat, DEFAULT_QUALITY};
use crate::error::Result;
use crate::palette::FALLBACK_PALETTE;

/// Range list used when the request gives none.
pub const DEFAULT_RANGES: &str = "min,max";

/// Styling and output options for one tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileRequest {
    pub tile: TileCoord,
    /// Output format name (`png`, `jpeg` or `base64`).
    pub format: String,
    pub mode: Option<String>,
    pub colormap: String,
    pub ranges: String,
    pub quality: u8,
    pub width: usize,
    pub height: usize,
}

impl TileRequest {
    pub fn new(tile: TileCoord, format: impl Into<String>) -> Self {
        Self {
            tile,
            format: format.into(),
            mode: None,
            colormap: FALLBACK_PALETTE.to_string(),
            ranges: DEFAULT_RANGES.to_string(),
            quality: DEFAULT_QUALITY,
            width: DEFAULT_TILE_SIZE as usize,
            height: DEFAULT_TILE_SIZE as usize,
        }
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_colormap(mut self, colormap: impl Into<String>) -> Self {
        self.colormap = colormap.into();
        self
    }

    pub fn with_ranges(mut self, ranges: impl Into<String>) -> Self {
        self.ranges = ranges.into();
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_size(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Encoded tile bytes with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTile {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
}

/// Render one tile of `dataset` described by `metadata`.
///
/// The format, mode and ranges are validated before any pixel is warped.
/// Every band is masked against the first band's nodata, and ranges resolve
/// against the first band's statistics. Tiles outside the raster render as
/// fully masked.
pub fn render_tile(
    dataset: &dyn RasterDataset,
    metadata: &RasterMetadata,
    request: &TileRequest,
) -> Result<EncodedTile> {
    let start = Instant::now();

    let format: OutputFormat = request.format.parse()?;
    let mode = resolve_mode(request.mode.as_deref(), dataset.band_count())?;
    let primary = metadata.primary_layer();
    let spec = ColormapSpec::new(mode, request.colormap.as_str(), request.ranges.as_str());
    let mut colormap = Colormap::build(&spec, primary.and_then(|l| l.stats.as_ref()))?;
    if let Some(datatype) = primary.and_then(|l| DataType::from_gdal_code(l.datatype)) {
        colormap = colormap.with_datatype(datatype);
    }

    let warped = warp_tile(dataset, request.tile, request.width, request.height)?;
    let nodata = primary.and_then(|l| l.nodata);
    let buffer = PixelBuffer::from_dataset(&warped, nodata)?;
    debug!(tile = %request.tile, mode = %mode, "Warped tile");

    let rgba = colormap.apply(&buffer)?;
    let bytes = encode_rgba(&rgba, request.width, request.height, format, request.quality)?;

    info!(
        tile = %request.tile,
        mode = %mode,
        format = %format,
        bytes = bytes.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Rendered tile"
    );

    Ok(EncodedTile {
        bytes,
        mime: format.mime_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use mapdrop_common::{BandStats, DatasetKind, LayerMetadata};
    use raster::{GeoTransform, MemRaster};

    fn metadata(nodata: Option<f64>, min: f64, max: f64) -> RasterMetadata {
        RasterMetadata {
            crs: "EPSG:3857".into(),
            epsg: Some(3857),
            geotransform: [0.0; 6],
            width: 0,
            height: 0,
            layers: vec![LayerMetadata {
                datatype: 6,
                nodata,
                name: "b1".into(),
                stats: Some(BandStats {
                    min,
                    max,
                    avg: (min + max) / 2.0,
                    percentiles: vec![],
                }),
            }],
            extent: String::new(),
            envelope: String::new(),
            kind: DatasetKind::Raster,
        }
    }

    /// Covers the whole zoom-0 tile with a constant value.
    fn world(value: f64) -> MemRaster {
        let e = mapdrop_common::WEB_MERCATOR_MAX_EXTENT;
        MemRaster::new(2, 2, GeoTransform::north_up(-e, e, e, -e), "EPSG:3857")
            .with_band(DataType::Float32, Some(-1.0), vec![value; 4])
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let req = TileRequest::new(TileCoord::new(1, 0, 0), "png");
        assert_eq!(req.ranges, "min,max");
        assert_eq!(req.quality, 75);
        assert_eq!((req.width, req.height), (256, 256));
        assert_eq!(req.mode, None);
    }

    #[test]
    fn test_bad_format_rejected_before_rendering() {
        let req = TileRequest::new(TileCoord::new(0, 0, 0), "gif");
        let err = render_tile(&world(1.0), &metadata(None, 0.0, 1.0), &req).unwrap_err();
        assert!(matches!(err, RenderError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_constant_world_tile() {
        let req = TileRequest::new(TileCoord::new(0, 0, 0), "png")
            .with_colormap("#000000,#ffffff")
            .with_size(8, 8);
        let tile = render_tile(&world(10.0), &metadata(Some(-1.0), 0.0, 10.0), &req).unwrap();
        assert_eq!(tile.mime, "image/png");

        let img = image::load_from_memory(&tile.bytes).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (8, 8));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn test_exact_matches_float32_samples() {
        let req = TileRequest::new(TileCoord::new(0, 0, 0), "png")
            .with_mode("exact")
            .with_colormap("#ff0000")
            .with_ranges("0.1")
            .with_size(4, 4);
        let tile = render_tile(&world(0.1), &metadata(Some(-1.0), 0.1, 0.1), &req).unwrap();
        let img = image::load_from_memory(&tile.bytes).unwrap().to_rgba8();
        assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
    }

    #[test]
    fn test_nodata_tile_is_transparent() {
        let req = TileRequest::new(TileCoord::new(0, 0, 0), "png").with_size(4, 4);
        let tile = render_tile(&world(-1.0), &metadata(Some(-1.0), 0.0, 10.0), &req).unwrap();
        let img = image::load_from_memory(&tile.bytes).unwrap().to_rgba8();
        assert!(img.pixels().all(|p| p.0[3] == 0));
    }
}
