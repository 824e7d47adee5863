use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::math::{Point3, Vector2, Vector3};
use crate::tessellation::TessellationParams;

use super::scope::Scope;
use super::split::{PieceKey, PieceSet};

/// Radius of a registration ridge, in mm.
pub const RIDGE_RADIUS: f64 = 2.0;
/// Fraction of the radial wall width a ridge spans.
const RIDGE_SPAN: f64 = 0.8;

/// Band of a split solid that carries registration features.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureBand {
    pub bottom_z: f64,
    pub top_z: f64,
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Vertical hole through the band that features must stay out of.
    pub opening: Option<Opening>,
}

/// A vertical cylindrical hole through a band, such as the ring's pour hole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Opening {
    pub center: (f64, f64),
    pub radius: f64,
}

impl FeatureBand {
    /// Heights of the two feature rows, at one and two thirds of the band.
    #[must_use]
    pub fn heights(&self) -> [f64; 2] {
        let h = self.top_z - self.bottom_z;
        [self.bottom_z + h / 3.0, self.bottom_z + 2.0 * h / 3.0]
    }

    #[must_use]
    pub fn mid_radius(&self) -> f64 {
        0.5 * (self.inner_radius + self.outer_radius)
    }

    #[must_use]
    pub fn ridge_length(&self) -> f64 {
        RIDGE_SPAN * (self.outer_radius - self.inner_radius)
    }
}

/// A horizontal feature axis lying in a split plane.
#[derive(Debug, Clone, Copy)]
struct Site {
    /// Centre of the feature in the xy plane.
    center: (f64, f64),
    direction: Vector3,
}

impl Site {
    /// Whether a feature of this `radius` and `length` stays out of `opening`.
    fn clear_of(&self, opening: &Opening, radius: f64, length: f64) -> bool {
        let dir = Vector2::new(self.direction.x, self.direction.y);
        let to_center = Vector2::new(
            opening.center.0 - self.center.0,
            opening.center.1 - self.center.1,
        );
        let along = to_center.dot(&dir).clamp(-0.5 * length, 0.5 * length);
        (to_center - dir * along).norm() >= opening.radius + radius
    }
}

/// Feature sites on the split planes a piece shares with its mate.
///
/// Halves meet on y = 0, on both the +x and -x sides. Quarters carry
/// features on x = 0 only: Q1 mates with Q2 (y > 0), Q3 with Q4 (y < 0).
/// Their faces on y = 0 (Q1 against Q3, Q2 against Q4) are deliberately
/// left without features; the x = 0 pair already locates every piece.
fn sites_for(key: PieceKey, mid: f64) -> Vec<Site> {
    let along_x = |x: f64| Site {
        center: (x, 0.0),
        direction: Vector3::x(),
    };
    let along_y = |y: f64| Site {
        center: (0.0, y),
        direction: Vector3::y(),
    };
    match key {
        PieceKey::Front | PieceKey::Back => vec![along_x(mid), along_x(-mid)],
        PieceKey::Q1 | PieceKey::Q2 => vec![along_y(mid)],
        PieceKey::Q3 | PieceKey::Q4 => vec![along_y(-mid)],
    }
}

/// Adds interlocking ridges and grooves to the mating faces of split pieces.
///
/// `Front`, `Q1` and `Q3` gain fused ridges of radius 2 mm. `Back`, `Q2` and
/// `Q4` lose grooves of radius `2 + clearance` that are `2 × clearance`
/// longer, so the ridges seat with clearance all round. Features sit at one
/// and two thirds of the band height, centred in the wall. Sites whose
/// groove would run into the band's opening are skipped on every piece.
///
/// # Errors
///
/// `BooleanOperationFailure` if a fuse or cut fails.
pub fn add_ridge_groove<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    mut pieces: PieceSet,
    band: &FeatureBand,
    clearance: f64,
    params: &TessellationParams,
) -> Result<PieceSet, MouldError> {
    let ridge_length = band.ridge_length();
    let groove_radius = RIDGE_RADIUS + clearance;
    let groove_length = ridge_length + 2.0 * clearance;

    let keys: Vec<(PieceKey, _)> = pieces.iter().collect();
    for (key, original) in keys {
        let (radius, length) = if key.has_ridges() {
            (RIDGE_RADIUS, ridge_length)
        } else {
            (groove_radius, groove_length)
        };
        let segments = params.segments_for_radius(radius);

        let mut piece = original;
        for site in sites_for(key, band.mid_radius()) {
            // Ridge and groove sites are filtered alike so mates still match.
            if let Some(opening) = &band.opening {
                if !site.clear_of(opening, groove_radius, groove_length) {
                    tracing::debug!(
                        %key,
                        x = site.center.0,
                        y = site.center.1,
                        "feature site skipped beside opening"
                    );
                    continue;
                }
            }
            for z in band.heights() {
                let center = Point3::new(site.center.0, site.center.1, z);
                let base = center - site.direction * (0.5 * length);
                let feature = scope.make_cylinder(base, site.direction, radius, length, segments)?;
                let next = if key.has_ridges() {
                    scope.union(piece, feature)
                } else {
                    scope.subtract(piece, feature)
                };
                scope.dispose(feature);
                let next = next?;
                scope.dispose(piece);
                piece = next;
            }
        }
        pieces.replace(key, piece);
    }
    tracing::debug!(pieces = pieces.len(), clearance, "registration features added");
    Ok(pieces)
}
