mod tessellate_solid;

pub use tessellate_solid::TessellateSolid;

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::TessellationError;
use crate::math::{Point3, Vector3};
use crate::operations::creation::round_segments;

/// Parameters controlling tessellation quality.
///
/// The deflections drive both how finely curved profiles are flattened and
/// how many facets a revolution gets, so a preset fixes the resolution of
/// every solid built from it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TessellationParams {
    /// Maximum allowed chordal deviation from the true geometry, in mm.
    pub linear_deflection: f64,
    /// Maximum angle between neighbouring facets of a revolution, in radians.
    pub angular_deflection: f64,
    /// Minimum number of segments for a full revolution.
    pub min_segments: u32,
    /// Maximum number of segments for a full revolution.
    pub max_segments: u32,
}

impl TessellationParams {
    /// Coarse preset for interactive preview.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            linear_deflection: 0.5,
            angular_deflection: 0.5,
            min_segments: 16,
            max_segments: 96,
        }
    }

    /// Preset for standard exports.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            linear_deflection: 0.1,
            angular_deflection: 0.3,
            min_segments: 32,
            max_segments: 256,
        }
    }

    /// Fine preset for high-resolution exports.
    #[must_use]
    pub fn high() -> Self {
        Self {
            linear_deflection: 0.02,
            angular_deflection: 0.1,
            min_segments: 64,
            max_segments: 512,
        }
    }

    /// Checks that the deflections are positive and the segment range is sane.
    ///
    /// # Errors
    ///
    /// Returns `TessellationError::InvalidParameters` naming the bad field.
    pub fn validate(&self) -> std::result::Result<(), TessellationError> {
        if self.linear_deflection.is_nan() || self.linear_deflection <= 0.0 {
            return Err(TessellationError::InvalidParameters(format!(
                "linear deflection must be positive, got {}",
                self.linear_deflection
            )));
        }
        if self.angular_deflection.is_nan() || self.angular_deflection <= 0.0 {
            return Err(TessellationError::InvalidParameters(format!(
                "angular deflection must be positive, got {}",
                self.angular_deflection
            )));
        }
        if self.min_segments == 0 || self.min_segments > self.max_segments {
            return Err(TessellationError::InvalidParameters(format!(
                "segment range {}..={} is empty",
                self.min_segments, self.max_segments
            )));
        }
        Ok(())
    }

    /// Number of segments for a full revolution at `radius`.
    ///
    /// Takes the finer of the chordal and angular limits, clamps it to the
    /// configured range and rounds up to a multiple of four.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn segments_for_radius(&self, radius: f64) -> u32 {
        let by_angle = (TAU / self.angular_deflection).ceil();
        let by_chord = if radius > self.linear_deflection {
            let half_angle = (1.0 - self.linear_deflection / radius).acos();
            (TAU / (2.0 * half_angle)).ceil()
        } else {
            0.0
        };
        let computed = by_angle.max(by_chord).min(f64::from(u32::MAX)) as u32;
        round_segments(computed.clamp(self.min_segments, self.max_segments))
    }
}

impl Default for TessellationParams {
    fn default() -> Self {
        Self::standard()
    }
}

/// A triangle mesh approximation of a solid.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals.
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Corner positions of triangle `i`.
    #[must_use]
    pub fn triangle(&self, i: usize) -> [Point3; 3] {
        let [a, b, c] = self.indices[i];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Enclosed volume from the signed tetrahedra against the origin.
    ///
    /// Only meaningful for closed, consistently oriented meshes.
    #[must_use]
    pub fn signed_volume(&self) -> f64 {
        (0..self.indices.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                a.coords.dot(&b.coords.cross(&c.coords))
            })
            .sum::<f64>()
            / 6.0
    }
}
