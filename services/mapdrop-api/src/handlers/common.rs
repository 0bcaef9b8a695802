//! Shared response helpers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use mapdrop_common::MapdropError;

/// JSON error body `{"error": <code>, "message": <text>}` with the error's status.
pub fn error_response(err: &MapdropError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if status.is_server_error() {
        error!(code = err.code(), error = %err, "Request failed");
    } else {
        warn!(code = err.code(), error = %err, "Request rejected");
    }

    (
        status,
        Json(json!({
            "error": err.code(),
            "message": err.to_string(),
        })),
    )
        .into_response()
}
