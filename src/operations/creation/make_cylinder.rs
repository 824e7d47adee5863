use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{Polygon, SolidData, SolidId, SolidStore};

use super::round_segments;

const DEFAULT_SEGMENTS: u32 = 32;

/// Creates a faceted cylinder from a base center, radius, axis, and height.
///
/// The circle is approximated by an inscribed regular polygon. Vertices sit
/// half a step off the frame directions, so for a coordinate-aligned axis no
/// vertex lies on a coordinate plane through the axis.
pub struct MakeCylinder {
    center: Point3,
    radius: f64,
    axis: Vector3,
    height: f64,
    segments: u32,
}

impl MakeCylinder {
    /// Creates a new `MakeCylinder` operation.
    #[must_use]
    pub fn new(center: Point3, radius: f64, axis: Vector3, height: f64) -> Self {
        Self {
            center,
            radius,
            axis,
            height,
            segments: DEFAULT_SEGMENTS,
        }
    }

    /// Sets the number of side facets (rounded up to a multiple of four).
    #[must_use]
    pub fn with_segments(mut self, segments: u32) -> Self {
        self.segments = segments;
        self
    }

    /// Executes the operation, creating the cylinder in the store.
    ///
    /// A negative height extends the cylinder against the axis direction.
    ///
    /// # Errors
    ///
    /// Returns an error if the radius or height is near zero, or the axis
    /// direction is degenerate.
    pub fn execute(&self, store: &mut SolidStore) -> Result<SolidId> {
        if self.radius < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder radius must be positive".into()).into(),
            );
        }
        if self.height.abs() < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder height must be non-zero".into()).into(),
            );
        }
        let axis_len = self.axis.norm();
        if axis_len < TOLERANCE {
            return Err(
                OperationError::InvalidInput("cylinder axis must be non-zero".into()).into(),
            );
        }
        let axis = self.axis / axis_len;
        let mut base = self.center;
        if self.height < 0.0 {
            base += axis * self.height;
        }
        let h = self.height.abs();

        let u = perpendicular_dir(&axis);
        let v = axis.cross(&u);

        let n = round_segments(self.segments);
        let step = TAU / f64::from(n);
        let ring = |offset: &Vector3| -> Vec<Point3> {
            (0..n)
                .map(|i| {
                    let theta = (f64::from(i) + 0.5) * step;
                    base + offset + (u * theta.cos() + v * theta.sin()) * self.radius
                })
                .collect()
        };
        let bottom = ring(&Vector3::zeros());
        let top = ring(&(axis * h));

        let mut polygons = Vec::with_capacity(n as usize + 2);
        let mut bottom_cap = bottom.clone();
        bottom_cap.reverse();
        polygons.push(Polygon::new(bottom_cap)?);
        polygons.push(Polygon::new(top.clone())?);
        let count = bottom.len();
        for i in 0..count {
            let j = (i + 1) % count;
            polygons.push(Polygon::new(vec![bottom[i], bottom[j], top[j], top[i]])?);
        }

        Ok(store.add_solid(SolidData::new(polygons)))
    }
}

/// Finds a unit direction perpendicular to the given unit vector.
fn perpendicular_dir(axis: &Vector3) -> Vector3 {
    let candidate = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let perp = axis.cross(&candidate);
    perp / perp.norm()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::operations::query::BoundingBox;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn cylinder_face_count() {
        let mut store = SolidStore::new();
        let solid = MakeCylinder::new(p(0.0, 0.0, 0.0), 3.0, Vector3::z(), 6.0)
            .with_segments(30)
            .execute(&mut store)
            .unwrap();
        // 30 rounds up to 32 sides, plus two caps.
        assert_eq!(store.solid(solid).unwrap().polygons.len(), 34);
    }

    #[test]
    fn cylinder_bounding_box() {
        let mut store = SolidStore::new();
        let solid = MakeCylinder::new(p(0.0, 0.0, 0.0), 2.0, Vector3::z(), 5.0)
            .execute(&mut store)
            .unwrap();

        let aabb = BoundingBox::new(solid).execute(&store).unwrap();
        assert!((aabb.min.z - 0.0).abs() < 1e-9);
        assert!((aabb.max.z - 5.0).abs() < 1e-9);
        assert!(aabb.max.x <= 2.0 + 1e-9);
        assert!(aabb.max.x > 1.9);
    }

    #[test]
    fn no_vertex_on_coordinate_planes() {
        let mut store = SolidStore::new();
        let solid = MakeCylinder::new(p(0.0, 0.0, 0.0), 2.0, Vector3::x(), 4.0)
            .execute(&mut store)
            .unwrap();
        for poly in &store.solid(solid).unwrap().polygons {
            for v in poly.vertices() {
                assert!(v.y.abs() > 1e-3 && v.z.abs() > 1e-3);
            }
        }
    }

    #[test]
    fn negative_height_keeps_outward_normals() {
        let mut store = SolidStore::new();
        let solid = MakeCylinder::new(p(0.0, 0.0, 0.0), 1.0, Vector3::y(), -3.0)
            .execute(&mut store)
            .unwrap();
        let center = p(0.0, -1.5, 0.0);
        for poly in &store.solid(solid).unwrap().polygons {
            assert!(poly.normal().dot(&(poly.centroid() - center)) > 0.0);
        }
    }

    #[test]
    fn zero_radius_fails() {
        let mut store = SolidStore::new();
        let result = MakeCylinder::new(p(0.0, 0.0, 0.0), 0.0, Vector3::z(), 5.0)
            .execute(&mut store);
        assert!(result.is_err());
    }

    #[test]
    fn zero_height_fails() {
        let mut store = SolidStore::new();
        let result = MakeCylinder::new(p(0.0, 0.0, 0.0), 3.0, Vector3::z(), 0.0)
            .execute(&mut store);
        assert!(result.is_err());
    }
}
