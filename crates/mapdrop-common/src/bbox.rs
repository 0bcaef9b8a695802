//! Bounding box and footprint polygon types.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// A geographic or projected bounding box.
///
/// For geographic CRS (EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857, etc.), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bbox = BoundingBox::new(first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        Some(bbox)
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// The box as a closed polygon, starting at the lower-right corner and
    /// running counter-clockwise.
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(vec![
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
            (self.min_x, self.min_y),
        ])
    }
}

/// A simple polygon with a single exterior ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    exterior: Vec<(f64, f64)>,
}

impl Polygon {
    /// Build a polygon from ring vertices. The ring is closed if the last
    /// vertex does not repeat the first.
    pub fn new(mut ring: Vec<(f64, f64)>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last {
                ring.push(first);
            }
        }
        Self { exterior: ring }
    }

    /// Vertices of the closed exterior ring.
    pub fn exterior(&self) -> &[(f64, f64)] {
        &self.exterior
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.exterior)
    }

    /// Well-known text, e.g. `POLYGON ((0 0, 1 0, 1 1, 0 0))`.
    pub fn to_wkt(&self) -> String {
        if self.exterior.is_empty() {
            return "POLYGON EMPTY".to_string();
        }

        let mut wkt = String::from("POLYGON ((");
        for (i, (x, y)) in self.exterior.iter().enumerate() {
            if i > 0 {
                wkt.push_str(", ");
            }
            let _ = write!(wkt, "{} {}", x, y);
        }
        wkt.push_str("))");
        wkt
    }
}
