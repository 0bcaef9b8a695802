//! Rendering error type.

use mapdrop_common::MapdropError;
use raster::RasterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Unknown mode, or a mode the band layout cannot support.
    #[error("unsupported mode: {0}")]
    UnsupportedMode(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The resolved range values cannot drive the requested mode.
    #[error("invalid ranges: {0}")]
    InvalidRanges(String),

    #[error("pixel buffer is {actual} cells, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Raster(#[from] RasterError),
}

impl From<RenderError> for MapdropError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::UnsupportedMode(m) => MapdropError::UnsupportedMode(m),
            RenderError::UnsupportedFormat(f) => MapdropError::UnsupportedFormat(f),
            RenderError::InvalidRanges(msg) => MapdropError::validation("ranges", msg),
            RenderError::Raster(e) => e.into(),
            other => MapdropError::Render(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
