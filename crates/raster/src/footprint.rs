//! Raster footprint in WGS84.

use mapdrop_common::{BoundingBox, Polygon};
use projection::CoordinateTransform;

use crate::{GeoTransform, Result};

/// Points sampled per edge of the raster rectangle.
pub const EDGE_POINTS: usize = 10;

/// Footprint of a raster: its outline and the outline's bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub extent: Polygon,
    pub envelope: Polygon,
}

/// Sample the outline of the raster rectangle in native coordinates.
///
/// Walks top, right, bottom then left edges with `per_edge` evenly spaced
/// points each (the end point of an edge is the start of the next), then
/// reverses the ring.
pub fn outline(
    geotransform: &GeoTransform,
    width: usize,
    height: usize,
    per_edge: usize,
) -> Vec<(f64, f64)> {
    let (x_min, y_max) = geotransform.origin();
    let (dx, dy) = geotransform.pixel_size();
    let x_max = x_min + dx * width as f64;
    let y_min = y_max + dy * height as f64;

    let mut points = Vec::with_capacity(per_edge * 4);
    points.extend(linspace(x_min, x_max, per_edge).map(|x| (x, y_max)));
    points.extend(linspace(y_max, y_min, per_edge).map(|y| (x_max, y)));
    points.extend(linspace(x_max, x_min, per_edge).map(|x| (x, y_min)));
    points.extend(linspace(y_min, y_max, per_edge).map(|y| (x_min, y)));
    points.reverse();
    points
}

/// `n` evenly spaced values from `start` towards `stop`, excluding `stop`.
fn linspace(start: f64, stop: f64, n: usize) -> impl Iterator<Item = f64> {
    let step = (stop - start) / n as f64;
    (0..n).map(move |i| start + step * i as f64)
}

/// Transform the sampled outline point by point and derive the envelope.
pub fn footprint(
    geotransform: &GeoTransform,
    width: usize,
    height: usize,
    to_wgs84: &dyn CoordinateTransform,
) -> Result<Footprint> {
    let ring = to_wgs84.transform_points(&outline(geotransform, width, height, EDGE_POINTS))?;
    let extent = Polygon::new(ring);
    let envelope = extent
        .bounds()
        .map(|b: BoundingBox| b.to_polygon())
        .unwrap_or_else(|| Polygon::new(Vec::new()));
    Ok(Footprint { extent, envelope })
}
