//! Raster metadata and tile endpoints.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::instrument;

use crate::handlers::common::error_response;
use crate::paths::parse_tile_path;
use crate::service::TileParams;
use crate::state::AppState;

/// GET /api/metadata/*path - Raster metadata as JSON
#[instrument(skip(state))]
pub async fn metadata_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(path): Path<String>,
) -> Response {
    match state.service.get_metadata(&path).await {
        Ok(metadata) => Json(metadata).into_response(),
        Err(e) => error_response(&e),
    }
}

/// GET /api/tiles/*path/{z}/{x}/{y}.{format} - Rendered XYZ tile
#[instrument(skip(state, params))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(rest): Path<String>,
    Query(params): Query<TileParams>,
) -> Response {
    let (path, tile, format) = match parse_tile_path(&rest) {
        Ok(parts) => parts,
        Err(e) => return error_response(&e),
    };

    match state.service.render_tile(path, tile, format, params).await {
        Ok(encoded) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoded.mime)],
            encoded.bytes,
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}
