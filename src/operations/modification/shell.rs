use crate::error::{OperationError, Result};
use crate::math::polygon_2d::{clip_half_plane, find_self_intersection};
use crate::math::{Point2, Vector2, TOLERANCE};
use crate::operations::offset::PolygonOffset2D;
use crate::operations::shaping::Revolve;
use crate::topology::{SolidId, SolidStore};

/// Radius below which a section vertex is treated as lying on the axis.
const AXIS_TOLERANCE: f64 = 1e-9;
/// Height tolerance when matching the open face.
const HEIGHT_TOLERANCE: f64 = 1e-6;

/// Hollows a solid of revolution into a wall of uniform thickness, leaving
/// its flat top face open.
///
/// The open face is the planar, upward-facing face at `open_height`. A
/// negative `offset` grows the wall outward, keeping the original surface as
/// the cavity; a positive `offset` grows it inward.
///
/// The wall is built in the section plane: the section is mirrored across
/// the axis, extended above the opening, offset with self-intersection
/// trimming, and clipped back. The wall section is then revolved with the
/// original segment count.
///
/// Currently supports solids of revolution that touch the axis.
pub struct Shell {
    solid: SolidId,
    offset: f64,
    open_height: f64,
}

impl Shell {
    /// Creates a new `Shell` operation.
    #[must_use]
    pub fn new(solid: SolidId, offset: f64, open_height: f64) -> Self {
        Self {
            solid,
            offset,
            open_height,
        }
    }

    /// Executes the shell operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the offset is zero, the solid is not a solid of
    /// revolution, no open face exists at the given height, or the wall
    /// cannot be built at this thickness (it would collapse or cross itself).
    pub fn execute(&self, store: &mut SolidStore) -> Result<SolidId> {
        if self.offset.abs() < TOLERANCE {
            return Err(
                OperationError::InvalidInput("shell offset must be non-zero".into()).into(),
            );
        }
        let revolution = store.solid(self.solid)?.revolution.clone().ok_or_else(|| {
            OperationError::InvalidInput("shell requires a solid of revolution".into())
        })?;

        let chain = open_chain(&revolution.section, self.open_height)?;
        let grow = -self.offset;
        let moved = offset_chain(&chain, grow, self.open_height)?;
        let (outer, inner) = if grow > 0.0 {
            (moved, chain)
        } else {
            (chain, moved)
        };

        let mut section = outer;
        section.extend(inner.into_iter().rev());
        if find_self_intersection(&section).is_some() {
            return Err(OperationError::Failed("shell wall intersects itself".into()).into());
        }

        tracing::debug!(
            offset = self.offset,
            open_height = self.open_height,
            section = section.len(),
            "shell section built"
        );
        Revolve::new(section, revolution.segments).execute(store)
    }
}

fn on_axis(p: &Point2) -> bool {
    p.x <= AXIS_TOLERANCE
}

/// Extracts the surface chain of a counter-clockwise section: from the
/// bottom point on the axis up to the outer corner of the open face.
fn open_chain(section: &[Point2], open_height: f64) -> Result<Vec<Point2>> {
    let n = section.len();
    let start = (0..n)
        .find(|&i| on_axis(&section[i]) && !on_axis(&section[(i + 1) % n]))
        .ok_or_else(|| OperationError::InvalidInput("section does not touch the axis".into()))?;

    let mut walk = vec![section[start]];
    for step in 1..=n {
        let p = section[(start + step) % n];
        walk.push(p);
        if on_axis(&p) {
            break;
        }
    }

    let at_top = |p: &Point2| (p.y - open_height).abs() < HEIGHT_TOLERANCE;
    let last = walk.len() - 1;
    if !at_top(&walk[last]) {
        return Err(OperationError::Failed(format!(
            "no planar face at height {open_height}"
        ))
        .into());
    }
    let mut corner = last;
    while corner > 0 && at_top(&walk[corner - 1]) {
        corner -= 1;
    }
    if corner == last || corner == 0 {
        return Err(OperationError::Failed(format!(
            "no planar face at height {open_height}"
        ))
        .into());
    }
    if walk[..corner]
        .iter()
        .any(|p| p.y > open_height + HEIGHT_TOLERANCE)
    {
        return Err(OperationError::Failed(
            "open face is not the top of the solid".into(),
        )
        .into());
    }
    walk.truncate(corner + 1);
    Ok(walk)
}

/// Offsets a surface chain by `distance` (positive grows outward) and returns
/// the offset chain, cut off at the open face.
fn offset_chain(chain: &[Point2], distance: f64, open_height: f64) -> Result<Vec<Point2>> {
    let (Some(top), Some(prev)) = (chain.last(), chain.len().checked_sub(2).map(|i| chain[i]))
    else {
        return Err(OperationError::InvalidInput("surface chain is too short".into()).into());
    };

    // Continue the last wall segment above the opening so the offset is not
    // disturbed by the corner there. A rim curling inward is continued
    // straight up instead, so the extension stays clear of its mirror.
    let rise = 2.0 * distance.abs() + 1.0;
    let last_dir = top - prev;
    let vertical = top + Vector2::new(0.0, rise);
    let extension = if last_dir.y > 0.2 * last_dir.norm() {
        let along = top + last_dir * (rise / last_dir.y);
        if along.x >= 0.5 * top.x {
            along
        } else {
            vertical
        }
    } else {
        vertical
    };

    let mirror = |p: &Point2| Point2::new(-p.x, p.y);
    let mut full: Vec<Point2> = chain.to_vec();
    full.push(extension);
    full.push(mirror(&extension));
    full.extend(chain[1..].iter().rev().map(mirror));

    let offset = PolygonOffset2D::new(full, distance).execute()?;
    let right = clip_half_plane(&offset, &Vector2::new(-1.0, 0.0), 0.0);
    let below = clip_half_plane(&right, &Vector2::y(), open_height);
    open_chain(&below, open_height)
}
