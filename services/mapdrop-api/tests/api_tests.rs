//! Service and router tests against GeoTIFF files in a temp directory.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use mapdrop_common::{MapdropError, TileCoord, WEB_MERCATOR_MAX_EXTENT};
use mapdrop_api::{router, AppState, MapdropService, ServiceConfig, TileParams};
use metrics_exporter_prometheus::PrometheusBuilder;
use storage::{CacheSettings, KeyValueStore, MemoryStore};
use test_utils::{create_ramp, create_solid_rgb, GeoTiffSpec, TestDataDir};
use tower::ServiceExt;

// ============================================================================
// Helper functions
// ============================================================================

/// Data directory with a single-band Web Mercator ramp and a 3-band file.
fn data_dir() -> TestDataDir {
    let dir = TestDataDir::new().unwrap();
    let e = WEB_MERCATOR_MAX_EXTENT;

    let spec = GeoTiffSpec::web_mercator(4, 4, (-e, e), e / 2.0).with_nodata(-9999.0);
    let mut data = create_ramp(4, 4);
    data[15] = -9999.0;
    dir.add_f32("dem/ramp.tif", &spec, &data).unwrap();

    let spec = GeoTiffSpec::web_mercator(2, 2, (-e, e), e);
    dir.add_rgb8("rgb.tif", &spec, &create_solid_rgb(2, 2, [200, 100, 50]))
        .unwrap();

    dir
}

fn service(dir: &TestDataDir, store: MemoryStore) -> MapdropService {
    let config = ServiceConfig::new(dir.path()).with_cache_settings(CacheSettings {
        lock_ttl: Duration::from_secs(10),
        poll_interval: Duration::from_millis(10),
        poll_attempts: 3,
    });
    MapdropService::from_config(&config, Arc::new(store))
}

fn app(dir: &TestDataDir) -> Router {
    let config = ServiceConfig::new(dir.path());
    let service = MapdropService::from_config(&config, Arc::new(MemoryStore::new()));
    let state = Arc::new(AppState::new(service, config));
    let handle = PrometheusBuilder::new().build_recorder().handle();
    router(state, handle)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

// ============================================================================
// Service
// ============================================================================

#[tokio::test]
async fn test_metadata_is_cached_under_path() {
    let dir = data_dir();
    let store = MemoryStore::new();
    let svc = service(&dir, store.clone());

    let meta = svc.get_metadata("dem/ramp.tif").await.unwrap();
    assert_eq!(meta.epsg, Some(3857));
    assert_eq!(meta.layers.len(), 1);
    let stats = meta.layers[0].stats.as_ref().unwrap();
    assert_eq!(stats.min, 0.0);
    assert_eq!(stats.max, 14.0);

    assert!(store.get("dem/ramp.tif").await.unwrap().is_some());

    // Served from the cache even once the file is gone
    std::fs::remove_file(dir.path().join("dem/ramp.tif")).unwrap();
    assert_eq!(svc.get_metadata("dem/ramp.tif").await.unwrap(), meta);
}

#[tokio::test]
async fn test_fingerprint_keys() {
    let dir = data_dir();
    let store = MemoryStore::new();
    let config = ServiceConfig::new(dir.path()).with_fingerprint_keys(true);
    let svc = MapdropService::from_config(&config, Arc::new(store.clone()));

    svc.get_metadata("rgb.tif").await.unwrap();
    assert_eq!(store.get("rgb.tif").await.unwrap(), None);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_missing_raster_not_found() {
    let dir = data_dir();
    let svc = service(&dir, MemoryStore::new());
    let err = svc.get_metadata("nope.tif").await.unwrap_err();
    assert!(matches!(err, MapdropError::NotFound(_)));
}

#[tokio::test]
async fn test_traversal_rejected() {
    let dir = data_dir();
    let svc = service(&dir, MemoryStore::new());
    let err = svc.get_metadata("../etc/passwd").await.unwrap_err();
    assert!(matches!(err, MapdropError::Validation { .. }));
}

#[tokio::test]
async fn test_render_tile_formats() {
    let dir = data_dir();
    let svc = service(&dir, MemoryStore::new());
    let tile = TileCoord::new(0, 0, 0);

    let png = svc
        .render_tile("dem/ramp.tif", tile, "png", TileParams::default())
        .await
        .unwrap();
    assert_eq!(png.mime, "image/png");
    let img = image::load_from_memory(&png.bytes).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (256, 256));
    // Bottom-right source cell is nodata
    assert_eq!(img.get_pixel(255, 255).0[3], 0);
    assert_eq!(img.get_pixel(0, 0).0[3], 255);

    let err = svc
        .render_tile("dem/ramp.tif", tile, "gif", TileParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, MapdropError::UnsupportedFormat(_)));
}

#[tokio::test]
async fn test_render_rgb_ignores_requested_mode() {
    let dir = data_dir();
    let svc = service(&dir, MemoryStore::new());
    let params = TileParams {
        mode: Some("discrete".into()),
        ..TileParams::default()
    };
    let tile = svc
        .render_tile("rgb.tif", TileCoord::new(1, 1, 1), "png", params)
        .await
        .unwrap();
    let img = image::load_from_memory(&tile.bytes).unwrap().to_rgba8();
    assert!(img.pixels().all(|p| p.0 == [200, 100, 50, 255]));
}

#[tokio::test]
async fn test_render_single_band_as_rgb_unsupported() {
    let dir = data_dir();
    let svc = service(&dir, MemoryStore::new());
    let params = TileParams {
        mode: Some("rgb".into()),
        ..TileParams::default()
    };
    let err = svc
        .render_tile("dem/ramp.tif", TileCoord::new(0, 0, 0), "png", params)
        .await
        .unwrap_err();
    assert!(matches!(err, MapdropError::UnsupportedMode(_)));
}

// ============================================================================
// Router
// ============================================================================

#[tokio::test]
async fn test_health() {
    let dir = data_dir();
    let (status, _, body) = get(app(&dir), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn test_metadata_route() {
    let dir = data_dir();
    let (status, content_type, body) = get(app(&dir), "/api/metadata/dem/ramp.tif").await;
    assert_eq!(status, StatusCode::OK);
    assert!(content_type.starts_with("application/json"));

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["type"], "raster");
    assert_eq!(json["epsg"], 3857);
    assert_eq!(json["layers"][0]["name"], "b1");
    assert!(json["envelope"].as_str().unwrap().starts_with("POLYGON (("));
}

#[tokio::test]
async fn test_metadata_route_not_found() {
    let dir = data_dir();
    let (status, _, body) = get(app(&dir), "/api/metadata/missing.tif").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "NotFoundError");
}

#[tokio::test]
async fn test_tile_route() {
    let dir = data_dir();
    let (status, content_type, body) = get(
        app(&dir),
        "/api/tiles/dem/ramp.tif/0/0/0.jpeg?colormap=viridis&ranges=0,14&quality=60",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "image/jpeg");
    assert_eq!(&body[0..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_tile_route_errors() {
    let dir = data_dir();

    let (status, _, body) = get(app(&dir), "/api/tiles/dem/ramp.tif/0/0/0.gif").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "UnsupportedFormatError");

    let (status, _, _) = get(app(&dir), "/api/tiles/dem/ramp.tif/0/5/0.png").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = get(app(&dir), "/api/tiles/dem/ramp.tif/0/0/0.png?ranges=min").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "ValidationError");
}
