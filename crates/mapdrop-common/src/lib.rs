//! Common types and utilities shared across the mapdrop crates.

pub mod bbox;
pub mod error;
pub mod metadata;
pub mod tile;

pub use bbox::{BoundingBox, Polygon};
pub use error::{MapdropError, MapdropResult};
pub use metadata::{BandStats, DatasetKind, LayerMetadata, RasterMetadata, PERCENTILE_STEPS};
pub use tile::{TileCoord, DEFAULT_TILE_SIZE, WEB_MERCATOR_MAX_EXTENT};
