//! Raster access, warping and metadata extraction.
//!
//! Rasters are read through the [`RasterDataset`] seam so the extraction and
//! tile pipelines do not depend on a particular file format. Two backends
//! ship with the crate:
//! - [`GeoTiffRaster`] / [`GeoTiffOpener`] for GeoTIFF files on disk
//! - [`MemRaster`] for in-memory grids (tests, warp output)

pub mod dataset;
pub mod error;
pub mod extract;
pub mod footprint;
pub mod geotiff;
pub mod memory;
pub mod stats;
pub mod warp;

pub use dataset::{DataType, GeoTransform, RasterDataset, RasterOpener};
pub use error::{RasterError, Result};
pub use extract::{extract_metadata, MetadataExtractor};
pub use footprint::Footprint;
pub use geotiff::{GeoTiffOpener, GeoTiffRaster};
pub use memory::MemRaster;
pub use warp::{warp_tile, warp_to_bounds};
