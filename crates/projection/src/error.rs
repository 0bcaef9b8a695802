//! Projection error type.

use mapdrop_common::MapdropError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// No EPSG code or proj4 definition could be derived from the text.
    #[error("unidentifiable projection: {0}")]
    Unidentified(String),

    /// An EPSG code that is not in the definitions database.
    #[error("EPSG:{0} is not in the crs-definitions database")]
    UnknownEpsg(u32),

    /// proj4rs rejected the definition.
    #[error("invalid projection definition '{definition}': {message}")]
    InvalidDefinition { definition: String, message: String },

    /// A single point could not be transformed.
    #[error("transform of ({x}, {y}) failed: {message}")]
    TransformFailed { x: f64, y: f64, message: String },
}

impl From<ProjectionError> for MapdropError {
    fn from(err: ProjectionError) -> Self {
        MapdropError::Projection(err.to_string())
    }
}
