use crate::error::{OperationError, Result};
use crate::math::{Point3, TOLERANCE};
use crate::topology::{Polygon, SolidData, SolidId, SolidStore};

/// Creates an axis-aligned box solid from two corner points.
pub struct MakeBox {
    min_corner: Point3,
    max_corner: Point3,
}

impl MakeBox {
    /// Creates a new `MakeBox` operation.
    #[must_use]
    pub fn new(min_corner: Point3, max_corner: Point3) -> Self {
        Self {
            min_corner,
            max_corner,
        }
    }

    /// Executes the operation, creating the box in the store.
    ///
    /// The corners may be given in any order.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has zero extent along any axis.
    pub fn execute(&self, store: &mut SolidStore) -> Result<SolidId> {
        let lo = self.min_corner.inf(&self.max_corner);
        let hi = self.min_corner.sup(&self.max_corner);
        let extent = hi - lo;
        if extent.min() < TOLERANCE {
            return Err(OperationError::InvalidInput("box has zero extent".into()).into());
        }

        let c = |x: bool, y: bool, z: bool| {
            Point3::new(
                if x { hi.x } else { lo.x },
                if y { hi.y } else { lo.y },
                if z { hi.z } else { lo.z },
            )
        };
        let (f, t) = (false, true);
        let faces = [
            // -z
            [c(f, f, f), c(f, t, f), c(t, t, f), c(t, f, f)],
            // +z
            [c(f, f, t), c(t, f, t), c(t, t, t), c(f, t, t)],
            // -y
            [c(f, f, f), c(t, f, f), c(t, f, t), c(f, f, t)],
            // +y
            [c(f, t, f), c(f, t, t), c(t, t, t), c(t, t, f)],
            // -x
            [c(f, f, f), c(f, f, t), c(f, t, t), c(f, t, f)],
            // +x
            [c(t, f, f), c(t, t, f), c(t, t, t), c(t, f, t)],
        ];
        let polygons = faces
            .into_iter()
            .map(|quad| Polygon::new(quad.to_vec()))
            .collect::<Result<Vec<_>>>()?;

        Ok(store.add_solid(SolidData::new(polygons)))
    }
}
