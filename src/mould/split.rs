use std::fmt;

use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::math::Point3;
use crate::topology::SolidId;

use super::params::SplitCount;
use super::scope::Scope;

/// Cutting boxes are this many bounding-box diagonals across.
const CUTTER_SCALE: f64 = 10.0;
/// Smallest cutting-box size, in mm.
const MIN_CUTTER_SIZE: f64 = 1000.0;

/// Identifies one piece of a split solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKey {
    /// y > 0 half.
    Front,
    /// y < 0 half.
    Back,
    /// x > 0, y > 0.
    Q1,
    /// x < 0, y > 0.
    Q2,
    /// x > 0, y < 0.
    Q3,
    /// x < 0, y < 0.
    Q4,
}

impl PieceKey {
    /// Keys produced by a split, in output order.
    #[must_use]
    pub fn all(count: SplitCount) -> &'static [PieceKey] {
        match count {
            SplitCount::Halves => &[Self::Front, Self::Back],
            SplitCount::Quarters => &[Self::Q1, Self::Q2, Self::Q3, Self::Q4],
        }
    }

    /// Lower-case name used in part keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Back => "back",
            Self::Q1 => "q1",
            Self::Q2 => "q2",
            Self::Q3 => "q3",
            Self::Q4 => "q4",
        }
    }

    /// Whether this piece carries ridges (the others carry grooves).
    #[must_use]
    pub fn has_ridges(self) -> bool {
        matches!(self, Self::Front | Self::Q1 | Self::Q3)
    }
}

impl fmt::Display for PieceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pieces split from one parent solid, in [`PieceKey::all`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieceSet {
    pieces: Vec<(PieceKey, SolidId)>,
}

impl PieceSet {
    #[must_use]
    pub fn get(&self, key: PieceKey) -> Option<SolidId> {
        self.pieces
            .iter()
            .find(|(k, _)| *k == key)
            .map(|&(_, id)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceKey, SolidId)> + '_ {
        self.pieces.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    fn push(&mut self, key: PieceKey, solid: SolidId) {
        self.pieces.push((key, solid));
    }

    pub(crate) fn replace(&mut self, key: PieceKey, solid: SolidId) {
        if let Some(entry) = self.pieces.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = solid;
        } else {
            self.push(key, solid);
        }
    }
}

/// Which side of a coordinate plane through the axis a cutter removes.
#[derive(Debug, Clone, Copy)]
enum HalfSpace {
    NegativeX,
    PositiveX,
    NegativeY,
    PositiveY,
}

/// Splits `solid` into halves at y = 0, or quarters at y = 0 and x = 0.
///
/// Each piece is cut with an oversized box. The parent is left untouched;
/// cutters and intermediate halves are released as soon as they are used.
///
/// # Errors
///
/// `BooleanOperationFailure` if any cut fails or leaves an empty piece.
pub fn split<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    solid: SolidId,
    count: SplitCount,
) -> Result<PieceSet, MouldError> {
    let bounds = scope.bounding_box(solid)?;
    let size = (bounds.diagonal() * CUTTER_SCALE).max(MIN_CUTTER_SIZE);
    let z_mid = 0.5 * (bounds.min.z + bounds.max.z);

    let front = cut_away(scope, solid, HalfSpace::NegativeY, size, z_mid)?;
    let back = cut_away(scope, solid, HalfSpace::PositiveY, size, z_mid)?;

    let mut pieces = PieceSet::default();
    match count {
        SplitCount::Halves => {
            pieces.push(PieceKey::Front, front);
            pieces.push(PieceKey::Back, back);
        }
        SplitCount::Quarters => {
            for (half, right, left) in [
                (front, PieceKey::Q1, PieceKey::Q2),
                (back, PieceKey::Q3, PieceKey::Q4),
            ] {
                let x_pos = cut_away(scope, half, HalfSpace::NegativeX, size, z_mid)?;
                let x_neg = cut_away(scope, half, HalfSpace::PositiveX, size, z_mid)?;
                scope.dispose(half);
                pieces.push(right, x_pos);
                pieces.push(left, x_neg);
            }
            pieces.pieces.sort_by_key(|(k, _)| *k);
        }
    }
    tracing::debug!(pieces = pieces.len(), "solid split");
    Ok(pieces)
}

/// Subtracts a cube of edge `size` covering one half-space from `solid`.
fn cut_away<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    solid: SolidId,
    side: HalfSpace,
    size: f64,
    z_mid: f64,
) -> Result<SolidId, MouldError> {
    let h = 0.5 * size;
    let (x0, x1, y0, y1) = match side {
        HalfSpace::NegativeX => (-size, 0.0, -h, h),
        HalfSpace::PositiveX => (0.0, size, -h, h),
        HalfSpace::NegativeY => (-h, h, -size, 0.0),
        HalfSpace::PositiveY => (-h, h, 0.0, size),
    };
    let cutter = scope.make_box(
        Point3::new(x0, y0, z_mid - h),
        Point3::new(x1, y1, z_mid + h),
    )?;
    let piece = scope.subtract(solid, cutter);
    scope.dispose(cutter);
    piece
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::MeshKernel;
    use crate::mould::builder::annulus_section;
    use crate::mould::scope::with_scope;
    use approx::assert_relative_eq;

    fn volumes(count: SplitCount) -> (f64, Vec<(PieceKey, f64)>) {
        let mut kernel = MeshKernel::new();
        let result = with_scope(&mut kernel, |scope| {
            let ring = scope.revolve(&annulus_section(30.0, 36.0, 0.0, 50.0), 48)?;
            let total = scope.volume(ring)?.unwrap_or_default();
            let pieces = split(scope, ring, count)?;
            let mut each = Vec::new();
            for (key, id) in pieces.iter() {
                each.push((key, scope.volume(id)?.unwrap_or_default()));
            }
            Ok((total, each))
        })
        .unwrap();
        assert_eq!(kernel.live_solids(), 0);
        result
    }

    #[test]
    fn halves_sum_to_parent() {
        let (total, pieces) = volumes(SplitCount::Halves);
        let keys: Vec<PieceKey> = pieces.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec![PieceKey::Front, PieceKey::Back]);
        for (_, v) in &pieces {
            assert!(*v > 0.0);
            assert_relative_eq!(*v, total / 2.0, max_relative = 1e-9);
        }
        let sum: f64 = pieces.iter().map(|(_, v)| v).sum();
        assert_relative_eq!(sum, total, max_relative = 1e-9);
    }

    #[test]
    fn quarters_sum_to_parent() {
        let (total, pieces) = volumes(SplitCount::Quarters);
        assert_eq!(pieces.len(), 4);
        for (_, v) in &pieces {
            assert_relative_eq!(*v, total / 4.0, max_relative = 1e-9);
        }
    }

    #[test]
    fn quarter_bounds_follow_naming() {
        let mut kernel = MeshKernel::new();
        with_scope(&mut kernel, |scope| {
            let ring = scope.revolve(&annulus_section(30.0, 36.0, 0.0, 50.0), 48)?;
            let pieces = split(scope, ring, SplitCount::Quarters)?;
            let q2 = scope.bounding_box(pieces.get(PieceKey::Q2).unwrap())?;
            assert!(q2.max.x <= 1e-9 && q2.min.y >= -1e-9);
            let q3 = scope.bounding_box(pieces.get(PieceKey::Q3).unwrap())?;
            assert!(q3.min.x >= -1e-9 && q3.max.y <= 1e-9);
            Ok(())
        })
        .unwrap();
    }
}
