//! Error types for mapdrop services.

use thiserror::Error;

/// Result type alias using MapdropError.
pub type MapdropResult<T> = Result<T, MapdropError>;

/// Primary error type for metadata and tile operations.
#[derive(Debug, Error)]
pub enum MapdropError {
    // === Request Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    Validation { param: String, message: String },

    #[error("Raster not found: {0}")]
    NotFound(String),

    #[error("Unsupported colormap mode: {0}")]
    UnsupportedMode(String),

    #[error("Requested format not supported: {0}")]
    UnsupportedFormat(String),

    // === Data Errors ===
    #[error("Can't open raster: {0}")]
    RasterOpen(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("Rendering failed: {0}")]
    Render(String),

    // === Coordination Errors ===
    #[error("Metadata for '{0}' was not produced in time")]
    LockTimeout(String),

    #[error("Cache error: {0}")]
    Cache(String),

    // === Infrastructure Errors ===
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl MapdropError {
    /// Shorthand for a validation failure on a named parameter.
    pub fn validation(param: impl Into<String>, message: impl Into<String>) -> Self {
        MapdropError::Validation {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code, used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            MapdropError::Validation { .. } => "ValidationError",
            MapdropError::NotFound(_) => "NotFoundError",
            MapdropError::UnsupportedMode(_) => "UnsupportedModeError",
            MapdropError::UnsupportedFormat(_) => "UnsupportedFormatError",
            MapdropError::RasterOpen(_) => "RasterOpenError",
            MapdropError::Projection(_) => "ProjectionError",
            MapdropError::Render(_) => "RenderError",
            MapdropError::LockTimeout(_) => "LockTimeoutError",
            MapdropError::Cache(_) => "CacheError",
            MapdropError::Internal(_) => "InternalError",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MapdropError::Validation { .. }
            | MapdropError::UnsupportedMode(_)
            | MapdropError::UnsupportedFormat(_) => 400,

            MapdropError::NotFound(_) => 404,

            MapdropError::RasterOpen(_) | MapdropError::Projection(_) => 422,

            MapdropError::LockTimeout(_) => 503,

            _ => 500,
        }
    }

    /// Whether the caller may simply try again later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MapdropError::LockTimeout(_) | MapdropError::Cache(_))
    }
}

// Conversion from common error types
impl From<std::io::Error> for MapdropError {
    fn from(err: std::io::Error) -> Self {
        MapdropError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for MapdropError {
    fn from(err: serde_json::Error) -> Self {
        MapdropError::Cache(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MapdropError::validation("z", "not a number").http_status_code(), 400);
        assert_eq!(MapdropError::NotFound("a.tif".into()).http_status_code(), 404);
        assert_eq!(MapdropError::UnsupportedFormat("gif".into()).http_status_code(), 400);
        assert_eq!(MapdropError::LockTimeout("a.tif".into()).http_status_code(), 503);
        assert_eq!(MapdropError::Render("boom".into()).http_status_code(), 500);
    }

    #[test]
    fn test_only_lock_timeout_and_cache_are_retryable() {
        assert!(MapdropError::LockTimeout("a.tif".into()).is_retryable());
        assert!(!MapdropError::Projection("bad wkt".into()).is_retryable());
    }

    #[test]
    fn test_validation_message() {
        let err = MapdropError::validation("ranges", "need at least two values");
        assert_eq!(
            err.to_string(),
            "Invalid parameter value for 'ranges': need at least two values"
        );
        assert_eq!(err.code(), "ValidationError");
    }
}
