use std::collections::HashMap;

use crate::error::{Result, TessellationError};
use crate::math::{Point3, Vector3};
use crate::topology::{SolidId, SolidStore};

use super::{TessellationParams, TriangleMesh};

/// Grid size used to recognise shared corners between facets.
const WELD_CELL: f64 = 1e-6;

/// Tessellates all polygons of a solid into a combined triangle mesh.
///
/// Each convex polygon is fanned from its first vertex. Corners get their
/// own vertex per polygon; the normal at a corner averages the normals of
/// every facet meeting there that bends by less than twice the angular
/// deflection, so revolved walls shade smoothly while creases stay sharp.
pub struct TessellateSolid {
    solid: SolidId,
    params: TessellationParams,
}

impl TessellateSolid {
    /// Creates a new `TessellateSolid` operation.
    #[must_use]
    pub fn new(solid: SolidId, params: TessellationParams) -> Self {
        Self { solid, params }
    }

    /// Executes the tessellation, returning a combined triangle mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid is missing, has no faces, the
    /// parameters are invalid, or the mesh outgrows 32-bit indices.
    pub fn execute(&self, store: &SolidStore) -> Result<TriangleMesh> {
        self.params.validate()?;
        let solid = store.solid(self.solid)?;
        if solid.is_empty() {
            return Err(TessellationError::Failed("solid has no faces".into()).into());
        }

        // Facet normals (area weighted) meeting at each welded corner.
        let mut incident: HashMap<[i64; 3], Vec<Vector3>> = HashMap::new();
        for polygon in &solid.polygons {
            let weighted = polygon.normal() * polygon.area();
            for v in polygon.vertices() {
                incident.entry(weld_key(v)).or_default().push(weighted);
            }
        }

        let crease_cos = (2.0 * self.params.angular_deflection).min(std::f64::consts::PI).cos();
        let mut mesh = TriangleMesh::default();
        for polygon in &solid.polygons {
            let own = *polygon.normal();
            let base = u32::try_from(mesh.vertices.len())
                .map_err(|_| TessellationError::Failed("mesh exceeds u32 indices".into()))?;
            for v in polygon.vertices() {
                let smooth = incident
                    .get(&weld_key(v))
                    .into_iter()
                    .flatten()
                    .filter(|n| n.norm() > 0.0 && n.normalize().dot(&own) >= crease_cos)
                    .fold(Vector3::zeros(), |acc, n| acc + n);
                let normal = smooth.try_normalize(1e-12).unwrap_or(own);
                mesh.vertices.push(*v);
                mesh.normals.push(normal);
            }
            let count = u32::try_from(polygon.vertices().len())
                .map_err(|_| TessellationError::Failed("polygon too large".into()))?;
            for k in 1..count.saturating_sub(1) {
                mesh.indices.push([base, base + k, base + k + 1]);
            }
        }

        tracing::debug!(
            polygons = solid.polygons.len(),
            triangles = mesh.triangle_count(),
            "solid tessellated"
        );
        Ok(mesh)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn weld_key(p: &Point3) -> [i64; 3] {
    [
        (p.x / WELD_CELL).round() as i64,
        (p.y / WELD_CELL).round() as i64,
        (p.z / WELD_CELL).round() as i64,
    ]
}
