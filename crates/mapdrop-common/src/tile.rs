//! Web Mercator (XYZ) tile addressing.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Half the circumference of the Web Mercator sphere, in meters.
pub const WEB_MERCATOR_MAX_EXTENT: f64 = 20037508.342789244;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// A tile coordinate (z/x/y), top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Whether x and y fall inside the 2^z by 2^z matrix for this zoom.
    pub fn is_valid(&self) -> bool {
        if self.z > 30 {
            return false;
        }
        let n = 1u64 << self.z;
        (self.x as u64) < n && (self.y as u64) < n
    }

    /// Tile bounds in EPSG:3857 meters.
    pub fn xy_bounds(&self) -> BoundingBox {
        let tile_span = 2.0 * WEB_MERCATOR_MAX_EXTENT / (1u64 << self.z) as f64;

        let min_x = -WEB_MERCATOR_MAX_EXTENT + self.x as f64 * tile_span;
        let max_y = WEB_MERCATOR_MAX_EXTENT - self.y as f64 * tile_span;

        BoundingBox::new(min_x, max_y - tile_span, min_x + tile_span, max_y)
    }

    /// Tile bounds in WGS84 degrees.
    pub fn latlon_bounds(&self) -> BoundingBox {
        let n = (1u64 << self.z) as f64;

        let lon_min = self.x as f64 / n * 360.0 - 180.0;
        let lon_max = (self.x + 1) as f64 / n * 360.0 - 180.0;

        let lat_max = (PI * (1.0 - 2.0 * self.y as f64 / n)).sinh().atan().to_degrees();
        let lat_min = (PI * (1.0 - 2.0 * (self.y + 1) as f64 / n))
            .sinh()
            .atan()
            .to_degrees();

        BoundingBox::new(lon_min, lat_min, lon_max, lat_max)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_zoom_zero_covers_world() {
        let bbox = TileCoord::new(0, 0, 0).xy_bounds();
        assert!(approx(bbox.min_x, -WEB_MERCATOR_MAX_EXTENT));
        assert!(approx(bbox.max_x, WEB_MERCATOR_MAX_EXTENT));
        assert!(approx(bbox.min_y, -WEB_MERCATOR_MAX_EXTENT));
        assert!(approx(bbox.max_y, WEB_MERCATOR_MAX_EXTENT));
    }

    #[test]
    fn test_zoom_one_quadrants() {
        let top_left = TileCoord::new(1, 0, 0).xy_bounds();
        assert!(approx(top_left.min_x, -WEB_MERCATOR_MAX_EXTENT));
        assert!(approx(top_left.max_x, 0.0));
        assert!(approx(top_left.min_y, 0.0));
        assert!(approx(top_left.max_y, WEB_MERCATOR_MAX_EXTENT));

        let bottom_right = TileCoord::new(1, 1, 1).xy_bounds();
        assert!(approx(bottom_right.min_x, 0.0));
        assert!(approx(bottom_right.max_y, 0.0));
    }

    #[test]
    fn test_latlon_bounds() {
        let bbox = TileCoord::new(1, 1, 0).latlon_bounds();
        assert!(approx(bbox.min_x, 0.0));
        assert!(approx(bbox.max_x, 180.0));
        assert!(approx(bbox.min_y, 0.0));
        assert!((bbox.max_y - 85.0511287798).abs() < 1e-6);
    }

    #[test]
    fn test_validity() {
        assert!(TileCoord::new(2, 3, 3).is_valid());
        assert!(!TileCoord::new(2, 4, 0).is_valid());
        assert!(!TileCoord::new(31, 0, 0).is_valid());
    }
}
