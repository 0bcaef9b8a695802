//! Error types for raster access.

use mapdrop_common::MapdropError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while opening, reading or warping a raster.
#[derive(Error, Debug)]
pub enum RasterError {
    /// No raster exists at the requested path.
    #[error("raster not found: {0}")]
    NotFound(String),

    /// The file exists but could not be decoded as a raster.
    #[error("failed to open raster: {0}")]
    OpenFailed(String),

    /// Failed to read band data.
    #[error("failed to read raster data: {0}")]
    ReadFailed(String),

    /// A band index outside 1..=band_count.
    #[error("band {band} out of range (raster has {count} bands)")]
    BandOutOfRange { band: usize, count: usize },

    /// Sample layout or type the backend cannot represent.
    #[error("unsupported raster layout: {0}")]
    Unsupported(String),

    /// Invalid georeferencing.
    #[error("invalid raster metadata: {0}")]
    InvalidMetadata(String),

    /// Projection identification or transform failure.
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

impl RasterError {
    /// Create an OpenFailed error.
    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    /// Create a ReadFailed error.
    pub fn read_failed(msg: impl Into<String>) -> Self {
        Self::ReadFailed(msg.into())
    }

    /// Create an InvalidMetadata error.
    pub fn invalid_metadata(msg: impl Into<String>) -> Self {
        Self::InvalidMetadata(msg.into())
    }
}

impl From<std::io::Error> for RasterError {
    fn from(err: std::io::Error) -> Self {
        Self::ReadFailed(err.to_string())
    }
}

impl From<tiff::TiffError> for RasterError {
    fn from(err: tiff::TiffError) -> Self {
        Self::OpenFailed(err.to_string())
    }
}

impl From<RasterError> for MapdropError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::NotFound(path) => MapdropError::NotFound(path),
            RasterError::Projection(e) => e.into(),
            RasterError::OpenFailed(msg)
            | RasterError::Unsupported(msg)
            | RasterError::InvalidMetadata(msg) => MapdropError::RasterOpen(msg),
            other => MapdropError::RasterOpen(other.to_string()),
        }
    }
}

/// Result type for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err: MapdropError = RasterError::NotFound("a.tif".into()).into();
        assert_eq!(err.http_status_code(), 404);
    }

    #[test]
    fn test_projection_maps_to_projection() {
        let err: MapdropError = RasterError::from(ProjectionError::UnknownEpsg(1)).into();
        assert!(matches!(err, MapdropError::Projection(_)));
    }

    #[test]
    fn test_open_failed_maps_to_raster_open() {
        let err: MapdropError = RasterError::open_failed("not a tiff").into();
        assert!(matches!(err, MapdropError::RasterOpen(ref m) if m == "not a tiff"));
    }
}
