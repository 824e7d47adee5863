use std::f64::consts::TAU;

use crate::error::{OperationError, Result};
use crate::math::polygon_2d::{dedup_closed, signed_area};
use crate::math::{Point2, Point3};
use crate::operations::creation::round_segments;
use crate::topology::{Polygon, Revolution, SolidData, SolidId, SolidStore};

/// Radius below which a section vertex is treated as lying on the axis.
const AXIS_TOLERANCE: f64 = 1e-9;

/// Revolves a closed planar section 360 degrees around the z axis.
///
/// The section is given in `(r, z)` coordinates and must lie in `r >= 0`.
/// Its orientation does not matter. For each section edge a ring of facets
/// is generated:
/// - Edges lying on the axis produce nothing
/// - Edges with one end on the axis produce a triangle fan
/// - All other edges produce planar trapezoids
///
/// Facets start half an angular step off the x and y axes, so the planes
/// x = 0 and y = 0 never pass through a facet vertex. The normalized section
/// is kept on the solid for section-aware operations such as [`Shell`].
///
/// [`Shell`]: crate::operations::modification::Shell
pub struct Revolve {
    section: Vec<Point2>,
    segments: u32,
}

impl Revolve {
    /// Creates a new `Revolve` operation.
    #[must_use]
    pub fn new(section: Vec<Point2>, segments: u32) -> Self {
        Self { section, segments }
    }

    /// Executes the revolution, creating a solid in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the section has fewer than three distinct points,
    /// encloses no area, or reaches into negative radii.
    pub fn execute(&self, store: &mut SolidStore) -> Result<SolidId> {
        let mut section = dedup_closed(&self.section, AXIS_TOLERANCE);
        if section.len() < 3 {
            return Err(OperationError::InvalidInput(
                "revolve section must have at least 3 distinct points".into(),
            )
            .into());
        }
        if section.iter().any(|p| p.x < -AXIS_TOLERANCE) {
            return Err(OperationError::InvalidInput(
                "revolve section crosses the axis".into(),
            )
            .into());
        }
        let area = signed_area(&section);
        if area.abs() < AXIS_TOLERANCE {
            return Err(
                OperationError::InvalidInput("revolve section encloses no area".into()).into(),
            );
        }
        if area < 0.0 {
            section.reverse();
        }

        let n = round_segments(self.segments);
        let step = TAU / f64::from(n);
        let angles: Vec<(f64, f64)> = (0..=n)
            .map(|k| {
                let theta = (f64::from(k) + 0.5) * step;
                (theta.cos(), theta.sin())
            })
            .collect();
        let at = |p: &Point2, k: usize| -> Point3 {
            if p.x <= AXIS_TOLERANCE {
                return Point3::new(0.0, 0.0, p.y);
            }
            let (c, s) = angles[k % n as usize];
            Point3::new(p.x * c, p.x * s, p.y)
        };

        let mut polygons = Vec::new();
        let count = section.len();
        for i in 0..count {
            let a = section[i];
            let b = section[(i + 1) % count];
            let a_axis = a.x <= AXIS_TOLERANCE;
            let b_axis = b.x <= AXIS_TOLERANCE;
            if a_axis && b_axis {
                continue;
            }
            for k in 0..n as usize {
                let loop_points = if a_axis {
                    vec![at(&a, k), at(&b, k + 1), at(&b, k)]
                } else if b_axis {
                    vec![at(&a, k), at(&a, k + 1), at(&b, k)]
                } else {
                    vec![at(&a, k), at(&a, k + 1), at(&b, k + 1), at(&b, k)]
                };
                polygons.push(Polygon::new(loop_points)?);
            }
        }

        tracing::debug!(
            section = count,
            segments = n,
            faces = polygons.len(),
            "revolved section"
        );
        Ok(store.add_solid(SolidData::revolved(
            polygons,
            Revolution {
                section,
                segments: n,
            },
        )))
    }
}
