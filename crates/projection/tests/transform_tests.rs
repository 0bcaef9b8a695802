//! Integration tests for CRS resolution and transforms.

use projection::{identify_epsg, CoordinateTransform, Crs, ProjTransform, ProjectionError};

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_resolve_utm_wkt_and_transform_to_wgs84() {
    let wkt = r#"PROJCS["WGS 84 / UTM zone 33N",GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],AUTHORITY["EPSG","32633"]]"#;
    let crs = Crs::from_definition(wkt).unwrap();
    assert_eq!(crs.epsg, Some(32633));

    let t = ProjTransform::new(&crs, &Crs::wgs84()).unwrap();
    // False easting at the central meridian (15E) on the equator
    let (lon, lat) = t.transform(500000.0, 0.0).unwrap();
    assert!((lon - 15.0).abs() < 1e-6, "lon = {}", lon);
    assert!(lat.abs() < 1e-6, "lat = {}", lat);
}

#[test]
fn test_unknown_epsg_is_reported() {
    let err = Crs::from_epsg(1).unwrap_err();
    assert_eq!(err, ProjectionError::UnknownEpsg(1));
}

#[test]
fn test_proj4_matches_known_definition() {
    let proj4 = Crs::from_epsg(32633).unwrap().proj4;
    assert_eq!(identify_epsg(&proj4), Some(32633));
}

// ============================================================================
// Batch transforms
// ============================================================================

#[test]
fn test_transform_points_preserves_order() {
    let t = ProjTransform::new(&Crs::wgs84(), &Crs::web_mercator()).unwrap();
    let out = t
        .transform_points(&[(0.0, 0.0), (180.0, 0.0), (-180.0, 0.0)])
        .unwrap();
    assert_eq!(out.len(), 3);
    assert!(out[0].0.abs() < 1e-6);
    assert!((out[1].0 - 20037508.342789244).abs() < 1e-3);
    assert!((out[2].0 + 20037508.342789244).abs() < 1e-3);
}
