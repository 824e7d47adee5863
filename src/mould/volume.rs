use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::tessellation::TessellationParams;
use crate::topology::SolidId;

use super::layout::MouldLayout;
use super::scope::Scope;

/// Density of mixed plaster, g/cm³.
const PLASTER_DENSITY: f64 = 1.58;
/// Parts plaster per 170 parts of mix (water:plaster = 70:100).
const PLASTER_PARTS: f64 = 100.0;
const WATER_PARTS: f64 = 70.0;

/// Volumes used for plaster calculations, in mm³.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeReport {
    pub proof_volume: f64,
    /// Everything inside the inner mould's outer surface: wall plus core.
    pub inner_mould_volume: f64,
    pub cavity_volume: f64,
}

/// Plaster and water needed to fill the cavity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasterMix {
    pub cavity_cc: f64,
    pub plaster_grams: f64,
    pub water_grams: f64,
}

impl PlasterMix {
    #[must_use]
    pub fn from_report(report: &VolumeReport) -> Self {
        let cc = report.cavity_volume / 1000.0;
        let mass = cc * PLASTER_DENSITY;
        let total = PLASTER_PARTS + WATER_PARTS;
        Self {
            cavity_cc: cc,
            plaster_grams: mass * PLASTER_PARTS / total,
            water_grams: mass * WATER_PARTS / total,
        }
    }
}

/// Volume of a solid: the kernel's exact figure when it has one, otherwise
/// the enclosed volume of its tessellation.
///
/// # Errors
///
/// `KernelException` if neither measurement is possible.
pub fn measure_volume<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    solid: SolidId,
    params: &TessellationParams,
) -> Result<f64, MouldError> {
    if let Some(volume) = scope.volume(solid)? {
        return Ok(volume.abs());
    }
    let mesh = scope.tessellate(solid, params)?;
    Ok(mesh.signed_volume().abs())
}

/// Plaster cavity between inner mould, ring and outer mould.
///
/// Approximates the region inside the outer mould's inner cylinder, over
/// the full mould height, minus the inner mould and the ring. Never negative.
#[must_use]
pub fn cavity_volume(layout: &MouldLayout, inner_mould_volume: f64, ring_volume: f64) -> f64 {
    let radius = layout.outer_mould_inner_radius;
    let enclosed = PI * radius * radius * layout.mould_height();
    (enclosed - inner_mould_volume - ring_volume).max(0.0)
}

/// Analytic volume of the ring band, pour hole included, for when the ring
/// solid could not be built.
#[must_use]
pub fn ring_volume_estimate(layout: &MouldLayout) -> f64 {
    let (r0, r1) = (layout.ring_inner_radius, layout.ring_outer_radius);
    let height = layout.base_z - layout.ring_bottom_z;
    let hole = if layout.pour_hole_fits() {
        PI * layout.pour_hole_radius * layout.pour_hole_radius * height
    } else {
        0.0
    };
    (PI * (r1 * r1 - r0 * r0) * height - hole).max(0.0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::testing::FaultyKernel;
    use crate::kernel::MeshKernel;
    use crate::math::{Point2, Point3};
    use crate::mould::params::MouldParameters;
    use crate::mould::scope::with_scope;
    use approx::assert_relative_eq;

    #[test]
    fn plaster_mix_ratio() {
        let report = VolumeReport {
            cavity_volume: 170_000.0,
            ..VolumeReport::default()
        };
        let mix = PlasterMix::from_report(&report);
        assert_relative_eq!(mix.cavity_cc, 170.0);
        assert_relative_eq!(mix.plaster_grams, 158.0, epsilon = 1e-9);
        assert_relative_eq!(mix.water_grams, 110.6, epsilon = 1e-9);
        assert_relative_eq!(mix.water_grams / mix.plaster_grams, 0.7, epsilon = 1e-12);
    }

    #[test]
    fn cavity_is_clamped_at_zero() {
        let layout = MouldLayout::new(
            &[Point2::new(0.0, 0.0), Point2::new(10.0, 10.0)],
            &MouldParameters::default(),
        );
        assert_eq!(cavity_volume(&layout, 1e12, 0.0), 0.0);
        let full = cavity_volume(&layout, 0.0, 0.0);
        let r = layout.outer_mould_inner_radius;
        assert_relative_eq!(full, PI * r * r * layout.mould_height(), max_relative = 1e-12);
    }

    #[test]
    fn mesh_fallback_matches_exact_volume() {
        let corner = Point3::new(2.0, 3.0, 4.0);
        let exact = {
            let mut kernel = MeshKernel::new();
            with_scope(&mut kernel, |scope| {
                let id = scope.make_box(Point3::origin(), corner)?;
                measure_volume(scope, id, &TessellationParams::preview())
            })
            .unwrap()
        };
        let fallback = {
            let mut kernel = FaultyKernel::without_volume();
            with_scope(&mut kernel, |scope| {
                let id = scope.make_box(Point3::origin(), corner)?;
                assert!(scope.volume(id)?.is_none());
                measure_volume(scope, id, &TessellationParams::preview())
            })
            .unwrap()
        };
        assert_relative_eq!(exact, 24.0, epsilon = 1e-9);
        assert_relative_eq!(fallback, exact, epsilon = 1e-9);
    }

    #[test]
    fn ring_estimate_subtracts_hole() {
        let layout = MouldLayout::new(
            &[Point2::new(0.0, 0.0), Point2::new(30.0, 60.0)],
            &MouldParameters::default(),
        );
        let (r0, r1) = (layout.ring_inner_radius, layout.ring_outer_radius);
        let band = PI * (r1 * r1 - r0 * r0) * 10.0;
        assert_relative_eq!(
            ring_volume_estimate(&layout),
            band - PI * 25.0 * 10.0,
            max_relative = 1e-12
        );
    }
}
