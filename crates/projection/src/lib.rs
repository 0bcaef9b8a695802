//! Coordinate reference system identification and transformations.
//!
//! Projection math is delegated to `proj4rs`; EPSG definitions come from the
//! `crs-definitions` database. This crate adds the pieces the raster pipeline
//! needs on top:
//! - identifying an EPSG code from WKT, proj4 or `EPSG:n` text
//! - resolving a raster's projection text into a usable definition
//! - a `CoordinateTransform` seam so callers can swap in identity transforms

pub mod crs;
pub mod epsg;
pub mod error;
pub mod transform;

pub use crs::{Crs, EPSG_WEB_MERCATOR, EPSG_WGS84};
pub use epsg::identify_epsg;
pub use error::ProjectionError;
pub use transform::{CoordinateTransform, IdentityTransform, ProjTransform};
