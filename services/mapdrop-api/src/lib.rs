//! Mapdrop API service library.
//!
//! Serves raster metadata and XYZ tiles for rasters under a data directory.
//! Modules are public so the router can be driven from integration tests.

pub mod config;
pub mod handlers;
pub mod paths;
pub mod service;
pub mod state;

use std::sync::Arc;

use axum::{extract::Extension, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use config::{Args, ServiceConfig};
pub use service::{MapdropService, TileParams};
pub use state::AppState;

/// Build the HTTP router.
pub fn router(state: Arc<AppState>, prometheus_handle: PrometheusHandle) -> Router {
    Router::new()
        // Raster endpoints
        .route("/api/metadata/*path", get(handlers::metadata_handler))
        .route("/api/tiles/*rest", get(handlers::tile_handler))
        // Health check
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        // Layer extensions
        .layer(Extension(state))
        .layer(Extension(prometheus_handle))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
