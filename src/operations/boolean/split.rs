use crate::operations::query::Aabb;
use crate::topology::{Polygon, PolygonSplit};

use super::face_intersection::polygons_intersect;

/// Which solid a fragment originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolidSource {
    A,
    B,
}

/// A convex piece of one solid's boundary, cut along the other solid's faces.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub polygon: Polygon,
    pub source: SolidSource,
}

/// Splits `polygon` along every polygon of `cutters` that crosses it.
///
/// Each candidate cutter is re-tested against every current piece, so pieces
/// are only split where the other boundary actually passes through them.
/// The resulting pieces lie wholly inside or wholly outside the cutter solid.
pub fn split_polygon(
    polygon: &Polygon,
    cutters: &[(Polygon, Aabb)],
    tolerance: f64,
) -> Vec<Polygon> {
    let bounds = polygon.aabb();
    let mut pieces = vec![polygon.clone()];
    for (cutter, cutter_bounds) in cutters {
        if !bounds.overlaps(cutter_bounds, tolerance) {
            continue;
        }
        let mut next = Vec::with_capacity(pieces.len() + 1);
        for piece in pieces {
            if !polygons_intersect(&piece, cutter) {
                next.push(piece);
                continue;
            }
            match piece.split(cutter.plane()) {
                PolygonSplit::Spanning { front, back } => {
                    next.push(front);
                    next.push(back);
                }
                _ => next.push(piece),
            }
        }
        pieces = next;
    }
    pieces
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn with_bounds(polygon: Polygon) -> (Polygon, Aabb) {
        let bounds = polygon.aabb();
        (polygon, bounds)
    }

    #[test]
    fn split_by_two_crossing_walls() {
        let floor = Polygon::new(vec![
            p(0.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(4.0, 4.0, 0.0),
            p(0.0, 4.0, 0.0),
        ])
        .unwrap();
        let wall_x = Polygon::new(vec![
            p(1.0, -1.0, -1.0),
            p(1.0, 5.0, -1.0),
            p(1.0, 5.0, 1.0),
            p(1.0, -1.0, 1.0),
        ])
        .unwrap();
        // Stops short of the floor: must not cut it.
        let far_wall = Polygon::new(vec![
            p(3.0, -1.0, 0.5),
            p(3.0, 5.0, 0.5),
            p(3.0, 5.0, 1.0),
            p(3.0, -1.0, 1.0),
        ])
        .unwrap();
        let cutters = vec![with_bounds(wall_x), with_bounds(far_wall)];
        let pieces = split_polygon(&floor, &cutters, 1e-9);
        assert_eq!(pieces.len(), 2);
        let total: f64 = pieces.iter().map(Polygon::area).sum();
        assert!((total - 16.0).abs() < 1e-9);
    }
}
