use crate::error::Result;
use crate::topology::{SolidId, SolidStore};

/// Computes the exact volume enclosed by a faceted solid.
///
/// Sums the signed volume of the tetrahedra spanned by the origin and each
/// boundary triangle, `(1/6) * v0 . (v1 x v2)`. Polygons are fanned from
/// their first vertex. Outward winding makes the total positive.
pub struct Volume {
    solid: SolidId,
}

impl Volume {
    /// Creates a new `Volume` query.
    #[must_use]
    pub fn new(solid: SolidId) -> Self {
        Self { solid }
    }

    /// Executes the query, returning the volume (absolute value).
    ///
    /// # Errors
    ///
    /// Returns an error if the solid does not exist.
    pub fn execute(&self, store: &SolidStore) -> Result<f64> {
        let solid = store.solid(self.solid)?;

        let mut signed_volume = 0.0;
        for poly in &solid.polygons {
            let v = poly.vertices();
            let Some(v0) = v.first() else { continue };
            for pair in v[1..].windows(2) {
                signed_volume += v0.coords.dot(&pair[0].coords.cross(&pair[1].coords));
            }
        }

        Ok(signed_volume.abs() / 6.0)
    }
}
