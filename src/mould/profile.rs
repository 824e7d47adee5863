//! Vessel profiles and the transforms applied before any solid is built.

use serde::{Deserialize, Serialize};

use crate::error::MouldError;
use crate::math::bezier::CubicBezier;
use crate::math::Point2;
use crate::tessellation::TessellationParams;

/// Upper bound on chords per Bézier segment.
const MAX_CURVE_SEGMENTS: usize = 256;

/// A point in profile space: `x` is the radius, `y` the height (mm).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProfileCoord {
    pub x: f64,
    pub y: f64,
}

impl ProfileCoord {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn to_point(self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    fn scaled(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }
}

/// Shape of the segment arriving at a point from its predecessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SegmentType {
    #[default]
    Line,
    CubicBezier,
}

/// One vertex of a profile.
///
/// `control_point1` sits near the previous point and `control_point2` near
/// this one. A cubic segment missing either control point is drawn as a line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePoint {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub segment_type: SegmentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_point1: Option<ProfileCoord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_point2: Option<ProfileCoord>,
}

impl ProfilePoint {
    /// A point reached by a straight segment.
    #[must_use]
    pub fn line(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }

    /// A point reached by a cubic Bézier segment.
    #[must_use]
    pub fn cubic(x: f64, y: f64, control1: ProfileCoord, control2: ProfileCoord) -> Self {
        Self {
            x,
            y,
            segment_type: SegmentType::CubicBezier,
            control_point1: Some(control1),
            control_point2: Some(control2),
        }
    }

    fn coord(&self) -> ProfileCoord {
        ProfileCoord::new(self.x, self.y)
    }
}

/// Half cross-section of a vessel, ordered from foot to rim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile {
    pub points: Vec<ProfilePoint>,
}

impl Profile {
    #[must_use]
    pub fn new(points: Vec<ProfilePoint>) -> Self {
        Self { points }
    }

    /// Checks that the profile can be revolved.
    ///
    /// Warns (but accepts) when heights decrease, since such a vessel may
    /// not release from the mould.
    ///
    /// # Errors
    ///
    /// Returns `MouldError::InvalidProfile` for fewer than two points,
    /// non-finite or negative coordinates, or an interior point on the axis.
    pub fn validate(&self) -> Result<(), MouldError> {
        let invalid = |message: String| Err(MouldError::InvalidProfile(message));
        if self.points.len() < 2 {
            return invalid(format!(
                "a profile needs at least 2 points, got {}",
                self.points.len()
            ));
        }
        let last = self.points.len() - 1;
        for (i, p) in self.points.iter().enumerate() {
            let mut controls = p.control_point1.iter().chain(&p.control_point2);
            if !p.x.is_finite()
                || !p.y.is_finite()
                || controls.any(|c| !c.x.is_finite() || !c.y.is_finite())
            {
                return invalid(format!("point {i} is not finite"));
            }
            if p.x < 0.0 || p.y < 0.0 {
                return invalid(format!("point {i} has a negative coordinate"));
            }
            if p.x == 0.0 && i != 0 && i != last {
                return invalid(format!("interior point {i} touches the axis"));
            }
        }
        if self.points.iter().all(|p| p.x == 0.0) {
            return invalid("profile lies on the axis".into());
        }
        if self.points.windows(2).any(|w| w[1].y < w[0].y) {
            tracing::warn!("profile height decreases; the piece may not release");
        }
        Ok(())
    }

    /// Largest radius over the points (control points excluded).
    #[must_use]
    pub fn max_radius(&self) -> f64 {
        self.points.iter().map(|p| p.x).fold(0.0, f64::max)
    }

    /// Lowest height over the points.
    #[must_use]
    pub fn min_height(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f64::INFINITY, f64::min)
    }

    /// Highest height over the points.
    #[must_use]
    pub fn max_height(&self) -> f64 {
        self.points
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Flattens the profile into a polyline, subdividing Bézier segments so
    /// chords stay within the linear deflection.
    #[must_use]
    pub fn flatten(&self, params: &TessellationParams) -> Vec<Point2> {
        let Some(first) = self.points.first() else {
            return Vec::new();
        };
        let mut out = vec![first.coord().to_point()];
        for pair in self.points.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            match (next.segment_type, next.control_point1, next.control_point2) {
                (SegmentType::CubicBezier, Some(c1), Some(c2)) => {
                    let curve = CubicBezier::new(
                        prev.coord().to_point(),
                        c1.to_point(),
                        c2.to_point(),
                        next.coord().to_point(),
                    );
                    out.extend(curve.flatten(params.linear_deflection, MAX_CURVE_SEGMENTS));
                }
                _ => out.push(next.coord().to_point()),
            }
        }
        out
    }
}

/// Enlarges a profile so the fired piece shrinks back to the drawn size.
///
/// Every coordinate, control points included, is divided by `1 - rate`.
#[must_use]
pub fn scale_for_shrinkage(profile: &Profile, rate: f64) -> Profile {
    let factor = 1.0 / (1.0 - rate);
    let points = profile
        .points
        .iter()
        .map(|p| ProfilePoint {
            x: p.x * factor,
            y: p.y * factor,
            segment_type: p.segment_type,
            control_point1: p.control_point1.map(|c| c.scaled(factor)),
            control_point2: p.control_point2.map(|c| c.scaled(factor)),
        })
        .collect();
    Profile::new(points)
}

/// Adds a slip-well collar above the rim: out by the wall thickness, up by
/// the well height, and back in to the rim radius.
#[must_use]
pub fn extend_for_slip_well(profile: &Profile, wall_thickness: f64, well_height: f64) -> Profile {
    let mut extended = profile.clone();
    if well_height <= 0.0 {
        return extended;
    }
    if let Some(rim) = profile.points.last() {
        let outer = rim.x + wall_thickness;
        extended.points.extend([
            ProfilePoint::line(outer, rim.y),
            ProfilePoint::line(outer, rim.y + well_height),
            ProfilePoint::line(rim.x, rim.y + well_height),
        ]);
    }
    extended
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn vase() -> Profile {
        Profile::new(vec![
            ProfilePoint::line(0.0, 0.0),
            ProfilePoint::line(30.0, 0.0),
            ProfilePoint::cubic(
                25.0,
                100.0,
                ProfileCoord::new(45.0, 30.0),
                ProfileCoord::new(20.0, 70.0),
            ),
        ])
    }

    #[test]
    fn shrinkage_divides_by_one_minus_rate() {
        let scaled = scale_for_shrinkage(&vase(), 0.13);
        let rim = scaled.points.last().unwrap();
        assert_relative_eq!(rim.y, 114.942_528_735_632_18, epsilon = 1e-9);
        assert!((rim.y - 113.0).abs() > 1.0);
        let c1 = rim.control_point1.unwrap();
        assert_relative_eq!(c1.x, 45.0 / 0.87, epsilon = 1e-12);
    }

    #[test]
    fn slip_well_adds_collar() {
        let extended = extend_for_slip_well(&vase(), 2.4, 20.0);
        let tail: Vec<(f64, f64)> = extended.points[3..].iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(tail, vec![(27.4, 100.0), (27.4, 120.0), (25.0, 120.0)]);
        assert!(extended.points[3..]
            .iter()
            .all(|p| p.segment_type == SegmentType::Line));
    }

    #[test]
    fn no_well_leaves_profile_unchanged() {
        assert_eq!(extend_for_slip_well(&vase(), 2.4, 0.0), vase());
    }

    #[test]
    fn cubic_without_controls_is_a_line() {
        let mut profile = vase();
        profile.points[2].control_point2 = None;
        let flat = profile.flatten(&TessellationParams::standard());
        assert_eq!(flat.len(), 3);
    }

    #[test]
    fn finer_deflection_flattens_more_finely() {
        let coarse = vase().flatten(&TessellationParams::preview());
        let fine = vase().flatten(&TessellationParams::high());
        assert!(fine.len() > coarse.len());
        assert_eq!(fine.last(), Some(&Point2::new(25.0, 100.0)));
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = r#"[
            {"x": 0, "y": 0, "segmentType": "line"},
            {"x": 10, "y": 40, "segmentType": "cubicBezier",
             "controlPoint1": {"x": 12, "y": 10}, "controlPoint2": {"x": 8, "y": 30}}
        ]"#;
        let profile: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.points[1].segment_type, SegmentType::CubicBezier);
        assert_eq!(profile.points[1].control_point2, Some(ProfileCoord::new(8.0, 30.0)));
    }

    #[test]
    fn invalid_profiles_are_rejected() {
        let short = Profile::new(vec![ProfilePoint::line(1.0, 0.0)]);
        assert!(short.validate().is_err());
        let touching = Profile::new(vec![
            ProfilePoint::line(0.0, 0.0),
            ProfilePoint::line(0.0, 5.0),
            ProfilePoint::line(10.0, 10.0),
        ]);
        assert!(touching.validate().is_err());
        let negative = Profile::new(vec![
            ProfilePoint::line(0.0, 0.0),
            ProfilePoint::line(-1.0, 5.0),
        ]);
        assert!(negative.validate().is_err());
        assert!(vase().validate().is_ok());
    }
}
