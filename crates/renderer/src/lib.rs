//! Tile rendering for raster data.
//!
//! Implements:
//! - Colormaps (discrete, linear, exact, rgb) over named palettes or color lists
//! - PNG encoding (indexed or RGBA)
//! - JPEG and base64 data-URI output
//! - XYZ tile rendering on top of the raster warp

pub mod buffer;
pub mod color;
pub mod colormap;
pub mod encode;
pub mod error;
pub mod palette;
pub mod png;
pub mod tile;

pub use buffer::PixelBuffer;
pub use color::Color;
pub use colormap::{parse_ranges, resolve_mode, Colormap, ColormapSpec, Mode, RangeToken};
pub use encode::{encode_rgba, OutputFormat, DEFAULT_QUALITY};
pub use error::{RenderError, Result};
pub use tile::{render_tile, EncodedTile, TileRequest, DEFAULT_RANGES};
