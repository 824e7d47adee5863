use crate::error::{GeometryError, Result};

use super::{Point3, Vector3, PLANE_TOLERANCE, TOLERANCE};

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Front,
    Back,
    On,
}

/// An oriented infinite plane `normal · p = offset`.
///
/// The normal is always unit length. "Front" is the half-space the normal
/// points into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3,
    offset: f64,
}

impl Plane {
    /// Creates a plane through `origin` with the given normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;
        Ok(Self {
            normal,
            offset: normal.dot(&origin.coords),
        })
    }

    /// Fits a plane to a polygon loop using Newell's method.
    ///
    /// Works for any simple planar loop, including ones with collinear
    /// leading vertices.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop encloses no area.
    pub fn from_loop(points: &[Point3]) -> Result<Self> {
        let n = points.len();
        if n < 3 {
            return Err(GeometryError::Degenerate("plane needs three points".into()).into());
        }
        let mut normal = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for i in 0..n {
            let a = points[i];
            let b = points[(i + 1) % n];
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
            centroid += a.coords;
        }
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::Degenerate("loop encloses no area".into()).into());
        }
        #[allow(clippy::cast_precision_loss)]
        let centroid = Point3::from(centroid / n as f64);
        Self::from_normal(centroid, normal / len)
    }

    /// Returns the unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Returns the signed distance of the plane from the origin.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Signed distance from `point` to the plane (positive in front).
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies a point against the plane using [`PLANE_TOLERANCE`].
    #[must_use]
    pub fn side(&self, point: &Point3) -> Side {
        let d = self.signed_distance(point);
        if d > PLANE_TOLERANCE {
            Side::Front
        } else if d < -PLANE_TOLERANCE {
            Side::Back
        } else {
            Side::On
        }
    }

    /// Returns the same plane with the opposite orientation.
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            offset: -self.offset,
        }
    }

    /// Intersects the line `origin + t * dir` with the plane.
    ///
    /// Returns `None` when the line is parallel to the plane.
    #[must_use]
    pub fn intersect_line(&self, origin: &Point3, dir: &Vector3) -> Option<(Point3, f64)> {
        let denom = self.normal.dot(dir);
        if denom.abs() < TOLERANCE {
            return None;
        }
        let t = -self.signed_distance(origin) / denom;
        Some((origin + dir * t, t))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn loop_normal_follows_winding() {
        let plane =
            Plane::from_loop(&[p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(1.0, 1.0, 1.0)]).unwrap();
        assert!((plane.normal().z - 1.0).abs() < 1e-12);
        assert!((plane.offset() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sides_are_classified() {
        let plane = Plane::from_normal(Point3::origin(), Vector3::y()).unwrap();
        assert_eq!(plane.side(&p(0.0, 1.0, 0.0)), Side::Front);
        assert_eq!(plane.side(&p(0.0, -1.0, 0.0)), Side::Back);
        assert_eq!(plane.side(&p(5.0, 1e-9, 0.0)), Side::On);
        assert_eq!(plane.flipped().side(&p(0.0, 1.0, 0.0)), Side::Back);
    }

    #[test]
    fn degenerate_loop_is_rejected() {
        let result = Plane::from_loop(&[p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)]);
        assert!(result.is_err());
    }

    #[test]
    fn line_hits_plane() {
        let plane = Plane::from_normal(p(0.0, 0.0, 2.0), Vector3::z()).unwrap();
        let (hit, t) = plane
            .intersect_line(&p(1.0, 1.0, 0.0), &Vector3::new(0.0, 0.0, 1.0))
            .unwrap();
        assert!((hit.z - 2.0).abs() < 1e-12);
        assert!((t - 2.0).abs() < 1e-12);
        assert!(plane.intersect_line(&p(0.0, 0.0, 0.0), &Vector3::x()).is_none());
    }
}
