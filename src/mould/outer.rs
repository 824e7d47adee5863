//! Outer containment mould and base ring.

use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::math::{Point3, Vector3};
use crate::tessellation::TessellationParams;
use crate::topology::SolidId;

use super::builder::{annulus_section, revolve_closed_annulus};
use super::features::{add_ridge_groove, FeatureBand, Opening};
use super::layout::MouldLayout;
use super::params::MouldParameters;
use super::scope::Scope;
use super::split::{split, PieceSet};

/// How far the pour-hole cutter overshoots the ring band at each end.
const POUR_HOLE_OVERSHOOT: f64 = 1.0;

/// Builds the outer mould: an annular wall over the full mould height,
/// split and registered.
///
/// # Errors
///
/// `BooleanOperationFailure` if splitting or featuring fails, otherwise
/// whatever the kernel reports.
pub fn generate_outer_mould<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    layout: &MouldLayout,
    params: &MouldParameters,
    tessellation: &TessellationParams,
) -> Result<PieceSet, MouldError> {
    let band = FeatureBand {
        bottom_z: layout.ring_bottom_z,
        top_z: layout.top_z,
        inner_radius: layout.outer_mould_inner_radius,
        outer_radius: layout.outer_mould_outer_radius,
        opening: None,
    };
    let section = annulus_section(band.inner_radius, band.outer_radius, band.bottom_z, band.top_z);
    let wall = revolve_closed_annulus(scope, &section, tessellation)?;
    let pieces = split(scope, wall, params.split_count)?;
    scope.dispose(wall);
    add_ridge_groove(scope, pieces, &band, params.clearance, tessellation)
}

/// Builds the unsplit base ring, with its pour hole when it fits.
///
/// # Errors
///
/// Whatever the kernel reports for the revolve or the pour-hole cut.
pub fn build_ring_blank<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    layout: &MouldLayout,
    tessellation: &TessellationParams,
) -> Result<SolidId, MouldError> {
    let section = annulus_section(
        layout.ring_inner_radius,
        layout.ring_outer_radius,
        layout.ring_bottom_z,
        layout.base_z,
    );
    let ring = revolve_closed_annulus(scope, &section, tessellation)?;
    let Some(hole) = pour_hole(layout) else {
        tracing::debug!(
            radius = layout.pour_hole_radius,
            width = layout.ring_width(),
            "pour hole skipped"
        );
        return Ok(ring);
    };

    let base = Point3::new(
        hole.center.0,
        hole.center.1,
        layout.ring_bottom_z - POUR_HOLE_OVERSHOOT,
    );
    let height = layout.base_z - layout.ring_bottom_z + 2.0 * POUR_HOLE_OVERSHOOT;
    let cutter = scope.make_cylinder(
        base,
        Vector3::z(),
        hole.radius,
        height,
        tessellation.segments_for_radius(hole.radius),
    )?;
    let pierced = scope.subtract(ring, cutter);
    scope.dispose(cutter);
    let pierced = pierced?;
    scope.dispose(ring);
    Ok(pierced)
}

/// The ring's pour hole, centred in the band on the primary split plane so
/// each piece gets a matching notch. `None` when it does not fit.
fn pour_hole(layout: &MouldLayout) -> Option<Opening> {
    layout.pour_hole_fits().then(|| Opening {
        center: (layout.ring_mid_radius(), 0.0),
        radius: layout.pour_hole_radius,
    })
}

/// Splits and registers a ring blank the same way as the outer mould.
///
/// On halves the pour hole sits on the +x feature site, so the ring keeps
/// only the features on the -x side.
///
/// # Errors
///
/// `BooleanOperationFailure` if splitting or featuring fails.
pub fn finish_ring<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    blank: SolidId,
    layout: &MouldLayout,
    params: &MouldParameters,
    tessellation: &TessellationParams,
) -> Result<PieceSet, MouldError> {
    let band = FeatureBand {
        bottom_z: layout.ring_bottom_z,
        top_z: layout.base_z,
        inner_radius: layout.ring_inner_radius,
        outer_radius: layout.ring_outer_radius,
        opening: pour_hole(layout),
    };
    let pieces = split(scope, blank, params.split_count)?;
    add_ridge_groove(scope, pieces, &band, params.clearance, tessellation)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::MeshKernel;
    use crate::math::Point2;
    use crate::mould::params::SplitCount;
    use crate::mould::scope::with_scope;
    use crate::mould::features::RIDGE_RADIUS;
    use crate::mould::split::PieceKey;
    use crate::operations::boolean::{classify_point_in_polygons, PointClassification};
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn layout(pour_hole_radius: f64) -> MouldLayout {
        layout_for(&MouldParameters {
            pour_hole_radius,
            ..MouldParameters::default()
        })
    }

    fn layout_for(params: &MouldParameters) -> MouldLayout {
        let profile = [
            Point2::new(0.0, 0.0),
            Point2::new(30.0, 0.0),
            Point2::new(30.0, 60.0),
        ];
        MouldLayout::new(&profile, params)
    }

    fn ring_volume(pour_hole_radius: f64) -> f64 {
        let mut kernel = MeshKernel::new();
        let params = TessellationParams::standard();
        let volume = with_scope(&mut kernel, |scope| {
            let ring = build_ring_blank(scope, &layout(pour_hole_radius), &params)?;
            Ok(scope.volume(ring)?.unwrap_or_default())
        })
        .unwrap();
        assert_eq!(kernel.live_solids(), 0);
        volume
    }

    #[test]
    fn pour_hole_cut_only_when_it_fits() {
        // Ring width is 24.5 mm, so the limit radius is 11.025 mm.
        let solid = ring_volume(0.0);
        let small = ring_volume(11.0);
        let large = ring_volume(11.05);
        assert!(small < solid - 0.9 * PI * 11.0 * 11.0 * 10.0);
        assert!((large - solid).abs() < 1e-6);
    }

    #[test]
    fn outer_mould_pieces() {
        let mut kernel = MeshKernel::new();
        let tessellation = TessellationParams::preview();
        let params = MouldParameters {
            split_count: SplitCount::Quarters,
            ..MouldParameters::default()
        };
        let keys = with_scope(&mut kernel, |scope| {
            let pieces = generate_outer_mould(scope, &layout(5.0), &params, &tessellation)?;
            for (_, id) in pieces.iter() {
                let bounds = scope.bounding_box(id)?;
                assert!((bounds.max.z - 60.0).abs() < 1e-9);
            }
            Ok(pieces.iter().map(|(k, _)| k).collect::<Vec<_>>())
        })
        .unwrap();
        assert_eq!(
            keys,
            vec![PieceKey::Q1, PieceKey::Q2, PieceKey::Q3, PieceKey::Q4]
        );
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn pour_hole_notch_stays_empty() {
        let mut kernel = MeshKernel::new();
        let tessellation = TessellationParams::preview();
        // Tall enough that the two rows of ridges do not overlap.
        let params = MouldParameters {
            ring_height: 15.0,
            ..MouldParameters::default()
        };
        let layout = layout_for(&params);
        let row_z = layout.ring_bottom_z + (layout.base_z - layout.ring_bottom_z) / 3.0;
        let (gain, notch) = with_scope(&mut kernel, |scope| {
            let blank = build_ring_blank(scope, &layout, &tessellation)?;
            let half = scope.volume(blank)?.unwrap_or_default() / 2.0;
            let pieces = finish_ring(scope, blank, &layout, &params, &tessellation)?;
            let front = pieces.get(PieceKey::Front).unwrap();
            let gain = scope.volume(front)?.unwrap_or_default() - half;
            // Inside the hole, where a +x ridge would bridge the notch.
            let point = Point3::new(layout.ring_mid_radius(), 1.0, row_z);
            let polygons = &scope.kernel().store().solid(front).unwrap().polygons;
            Ok((gain, classify_point_in_polygons(&point, polygons)))
        })
        .unwrap();
        assert_eq!(notch, PointClassification::Outside);

        // Only the two -x ridges remain.
        let n = f64::from(tessellation.segments_for_radius(RIDGE_RADIUS));
        let length = 0.8 * layout.ring_width();
        let ridge = 0.25 * n * (2.0 * PI / n).sin() * RIDGE_RADIUS * RIDGE_RADIUS * length;
        assert_relative_eq!(gain, 2.0 * ridge, max_relative = 1e-6);
        assert_eq!(kernel.live_solids(), 0);
    }
}
