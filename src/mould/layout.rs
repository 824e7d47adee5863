use crate::math::Point2;

use super::params::{MouldParameters, RING_CLEARANCE};

/// Fraction of the ring width a pour hole's diameter may take.
const POUR_HOLE_MAX_FRACTION: f64 = 0.9;

/// Radii and heights shared by every derived part. All values in mm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MouldLayout {
    pub inner_mould_outer_radius: f64,
    pub outer_mould_inner_radius: f64,
    pub outer_mould_outer_radius: f64,
    pub ring_inner_radius: f64,
    pub ring_outer_radius: f64,
    /// Bottom of the shelled inner mould.
    pub base_z: f64,
    /// Top of the slip-well-extended mould.
    pub top_z: f64,
    /// Bottom of the ring band and of the outer mould.
    pub ring_bottom_z: f64,
    pub pour_hole_radius: f64,
}

impl MouldLayout {
    /// Derives the layout from the flattened, shrinkage-scaled and
    /// slip-well-extended mould profile.
    #[must_use]
    pub fn new(mould_profile: &[Point2], params: &MouldParameters) -> Self {
        let max_radius = mould_profile.iter().map(|p| p.x).fold(0.0, f64::max);
        let min_height = mould_profile
            .iter()
            .map(|p| p.y)
            .fold(f64::INFINITY, f64::min);
        let top_z = mould_profile
            .iter()
            .map(|p| p.y)
            .fold(f64::NEG_INFINITY, f64::max);

        let inner_mould_outer_radius = max_radius + params.wall_thickness;
        let outer_mould_inner_radius = inner_mould_outer_radius + params.cavity_gap;
        let base_z = min_height - params.wall_thickness;
        Self {
            inner_mould_outer_radius,
            outer_mould_inner_radius,
            outer_mould_outer_radius: outer_mould_inner_radius + params.outer_wall_thickness,
            ring_inner_radius: inner_mould_outer_radius + RING_CLEARANCE,
            ring_outer_radius: inner_mould_outer_radius + params.cavity_gap,
            base_z,
            top_z,
            ring_bottom_z: base_z - params.ring_height,
            pour_hole_radius: params.pour_hole_radius,
        }
    }

    /// Full height of the outer mould, ring band included.
    #[must_use]
    pub fn mould_height(&self) -> f64 {
        self.top_z - self.ring_bottom_z
    }

    #[must_use]
    pub fn ring_width(&self) -> f64 {
        self.ring_outer_radius - self.ring_inner_radius
    }

    #[must_use]
    pub fn ring_mid_radius(&self) -> f64 {
        0.5 * (self.ring_inner_radius + self.ring_outer_radius)
    }

    /// Whether the pour hole leaves enough ring material around it.
    #[must_use]
    pub fn pour_hole_fits(&self) -> bool {
        self.pour_hole_radius > 0.0
            && 2.0 * self.pour_hole_radius < POUR_HOLE_MAX_FRACTION * self.ring_width()
    }
}
