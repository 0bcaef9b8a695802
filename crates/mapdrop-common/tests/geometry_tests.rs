//! Tests for bounding boxes, footprint polygons and tile bounds.

use mapdrop_common::tile::WEB_MERCATOR_MAX_EXTENT;
use mapdrop_common::{BoundingBox, Polygon, TileCoord};

// ============================================================================
// BoundingBox tests
// ============================================================================

#[test]
fn test_bbox_dimensions() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.width(), 360.0);
    assert_eq!(bbox.height(), 180.0);
}

#[test]
fn test_bbox_touching_edges_do_not_intersect() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
    assert!(!a.intersects(&b));
}

// ============================================================================
// Polygon tests
// ============================================================================

#[test]
fn test_polygon_already_closed_ring_is_kept() {
    let ring = vec![(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 0.0)];
    let poly = Polygon::new(ring.clone());
    assert_eq!(poly.exterior(), ring.as_slice());
}

#[test]
fn test_polygon_bounds_round_trip_to_envelope() {
    let poly = Polygon::new(vec![(1.0, 1.0), (4.0, 2.0), (3.0, 5.0)]);
    let bounds = poly.bounds().unwrap();
    assert_eq!(bounds, BoundingBox::new(1.0, 1.0, 4.0, 5.0));
    assert_eq!(
        bounds.to_polygon().to_wkt(),
        "POLYGON ((4 1, 4 5, 1 5, 1 1, 4 1))"
    );
}

#[test]
fn test_empty_polygon_wkt() {
    assert_eq!(Polygon::new(vec![]).to_wkt(), "POLYGON EMPTY");
}

#[test]
fn test_fractional_coordinates_in_wkt() {
    let poly = Polygon::new(vec![(0.5, -0.25), (1.5, -0.25), (1.5, 0.75)]);
    assert_eq!(
        poly.to_wkt(),
        "POLYGON ((0.5 -0.25, 1.5 -0.25, 1.5 0.75, 0.5 -0.25))"
    );
}

// ============================================================================
// Tile tests
// ============================================================================

#[test]
fn test_adjacent_tiles_share_edges() {
    let left = TileCoord::new(5, 10, 12).xy_bounds();
    let right = TileCoord::new(5, 11, 12).xy_bounds();
    let below = TileCoord::new(5, 10, 13).xy_bounds();

    assert!((left.max_x - right.min_x).abs() < 1e-6);
    assert!((left.min_y - below.max_y).abs() < 1e-6);
}

#[test]
fn test_tile_span_halves_per_zoom() {
    for z in 0..10 {
        let span = TileCoord::new(z, 0, 0).xy_bounds().width();
        let expected = 2.0 * WEB_MERCATOR_MAX_EXTENT / 2f64.powi(z as i32);
        assert!((span - expected).abs() < 1e-6, "zoom {}", z);
    }
}

#[test]
fn test_display() {
    assert_eq!(TileCoord::new(3, 2, 1).to_string(), "3/2/1");
}
