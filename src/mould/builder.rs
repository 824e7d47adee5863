use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::math::Point2;
use crate::tessellation::TessellationParams;
use crate::topology::SolidId;

use super::profile::Profile;
use super::scope::Scope;

/// Flattens a profile, closes it along the axis and revolves it 360°.
///
/// The section runs foot to rim, then in to `(0, rim height)` and down the
/// axis to `(0, foot height)`. A foot or rim already on the axis is merged
/// with its closing point.
///
/// # Errors
///
/// `InvalidProfile` if fewer than two points survive flattening, otherwise
/// whatever the kernel reports for the revolve.
pub fn build_and_revolve_open<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    profile: &Profile,
    params: &TessellationParams,
) -> Result<SolidId, MouldError> {
    let mut section = profile.flatten(params);
    let (Some(&bottom), Some(&top)) = (section.first(), section.last()) else {
        return Err(MouldError::InvalidProfile("profile is empty".into()));
    };
    if section.len() < 2 {
        return Err(MouldError::InvalidProfile(
            "profile needs at least two points".into(),
        ));
    }
    let max_radius = section.iter().map(|p| p.x).fold(0.0, f64::max);
    section.push(Point2::new(0.0, top.y));
    section.push(Point2::new(0.0, bottom.y));

    let segments = params.segments_for_radius(max_radius);
    tracing::debug!(points = section.len(), segments, "revolving profile");
    scope.revolve(&section, segments)
}

/// Revolves a closed section that does not touch the axis, such as the
/// annular rectangles of the outer mould and ring.
///
/// # Errors
///
/// Whatever the kernel reports for the revolve.
pub fn revolve_closed_annulus<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    section: &[Point2],
    params: &TessellationParams,
) -> Result<SolidId, MouldError> {
    let max_radius = section.iter().map(|p| p.x).fold(0.0, f64::max);
    scope.revolve(section, params.segments_for_radius(max_radius))
}

/// Counter-clockwise rectangle `[r0, r1] × [z0, z1]` in section space.
#[must_use]
pub fn annulus_section(r0: f64, r1: f64, z0: f64, z1: f64) -> Vec<Point2> {
    vec![
        Point2::new(r0, z0),
        Point2::new(r1, z0),
        Point2::new(r1, z1),
        Point2::new(r0, z1),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::MeshKernel;
    use crate::mould::profile::ProfilePoint;
    use crate::mould::scope::with_scope;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn open_profile_closes_on_axis() {
        let mut kernel = MeshKernel::new();
        let profile = Profile::new(vec![
            ProfilePoint::line(0.0, 0.0),
            ProfilePoint::line(20.0, 0.0),
            ProfilePoint::line(20.0, 50.0),
        ]);
        let params = TessellationParams::high();
        let volume = with_scope(&mut kernel, |scope| {
            let id = build_and_revolve_open(scope, &profile, &params)?;
            Ok(scope.volume(id)?.unwrap_or_default())
        })
        .unwrap();
        assert_relative_eq!(volume, PI * 400.0 * 50.0, max_relative = 5e-3);
    }

    #[test]
    fn annulus_volume() {
        let mut kernel = MeshKernel::new();
        let params = TessellationParams::high();
        let volume = with_scope(&mut kernel, |scope| {
            let id =
                revolve_closed_annulus(scope, &annulus_section(40.0, 46.0, -10.0, 90.0), &params)?;
            Ok(scope.volume(id)?.unwrap_or_default())
        })
        .unwrap();
        assert_relative_eq!(volume, PI * (46.0 * 46.0 - 1600.0) * 100.0, max_relative = 5e-3);
    }

    #[test]
    fn single_point_profile_is_invalid() {
        let mut kernel = MeshKernel::new();
        let profile = Profile::new(vec![ProfilePoint::line(3.0, 0.0)]);
        let result = with_scope(&mut kernel, |scope| {
            build_and_revolve_open(scope, &profile, &TessellationParams::preview())
        });
        assert!(matches!(result, Err(MouldError::InvalidProfile(_))));
    }
}
