//! HTTP request handlers.
//!
//! - `api`: raster metadata and XYZ tiles
//! - `metrics`: health check and Prometheus metrics
//! - `common`: JSON error responses

pub mod api;
pub mod common;
pub mod metrics;

pub use api::{metadata_handler, tile_handler};
pub use common::error_response;
pub use metrics::{health_handler, metrics_handler};
