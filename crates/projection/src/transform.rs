//! Point transformations between coordinate reference systems.

use proj4rs::proj::Proj;
use proj4rs::transform::transform;

use crate::{Crs, ProjectionError};

/// Transform a single point from one CRS into another.
///
/// Geographic coordinates are always degrees on both sides of the seam.
pub trait CoordinateTransform {
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError>;

    /// Transform a sequence of points, failing on the first bad one.
    fn transform_points(&self, points: &[(f64, f64)]) -> Result<Vec<(f64, f64)>, ProjectionError> {
        points.iter().map(|&(x, y)| self.transform(x, y)).collect()
    }
}

/// Source and target are the same CRS.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl CoordinateTransform for IdentityTransform {
    #[inline]
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        Ok((x, y))
    }
}

/// Coordinate transformer using proj4rs (pure Rust).
pub struct ProjTransform {
    source: Proj,
    target: Proj,
    /// True if source uses degrees (needs radian conversion)
    source_is_geographic: bool,
    /// True if target uses degrees (needs radian conversion)
    target_is_geographic: bool,
}

impl std::fmt::Debug for ProjTransform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjTransform")
            .field("source_is_geographic", &self.source_is_geographic)
            .field("target_is_geographic", &self.target_is_geographic)
            .finish_non_exhaustive()
    }
}

impl ProjTransform {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self, ProjectionError> {
        Ok(Self {
            source: parse_proj(&source.proj4)?,
            target: parse_proj(&target.proj4)?,
            source_is_geographic: source.is_geographic(),
            target_is_geographic: target.is_geographic(),
        })
    }

    /// Build the cheapest transform between two CRS: identity when they are
    /// the same, proj4rs otherwise.
    pub fn between(source: &Crs, target: &Crs) -> Result<Box<dyn CoordinateTransform>, ProjectionError> {
        if source.same_as(target) {
            return Ok(Box::new(IdentityTransform));
        }
        Ok(Box::new(Self::new(source, target)?))
    }
}

impl CoordinateTransform for ProjTransform {
    fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjectionError> {
        // proj4rs uses radians for geographic coordinates
        let mut point = if self.source_is_geographic {
            (x.to_radians(), y.to_radians(), 0.0)
        } else {
            (x, y, 0.0)
        };

        transform(&self.source, &self.target, &mut point).map_err(|e| {
            ProjectionError::TransformFailed {
                x,
                y,
                message: format!("{:?}", e),
            }
        })?;

        let (out_x, out_y) = if self.target_is_geographic {
            (point.0.to_degrees(), point.1.to_degrees())
        } else {
            (point.0, point.1)
        };

        if !out_x.is_finite() || !out_y.is_finite() {
            return Err(ProjectionError::TransformFailed {
                x,
                y,
                message: "non-finite result".to_string(),
            });
        }

        Ok((out_x, out_y))
    }
}

fn parse_proj(proj4: &str) -> Result<Proj, ProjectionError> {
    Proj::from_proj_string(proj4).map_err(|e| ProjectionError::InvalidDefinition {
        definition: proj4.to_string(),
        message: format!("{:?}", e),
    })
}
