use crate::math::{Plane, Point3, Side, Vector3, TOLERANCE};
use crate::topology::Polygon;

/// Returns `true` when the plane of `b` has to cut the convex polygon `a`.
///
/// `a` must straddle the plane of `b`, `b` must reach the plane of `a`, and
/// the segments each one cuts out of the common line of the two planes must
/// overlap. An edge of `b` lying in the plane of `a` counts: a face already
/// diced along the line where `a` meets the plane of `b` still cuts `a`.
/// Polygons that merely touch along a common edge or lie in a common plane
/// do not intersect.
#[must_use]
pub fn polygons_intersect(a: &Polygon, b: &Polygon) -> bool {
    if !straddles(a.vertices(), b.plane()) || !reaches(b.vertices(), a.plane()) {
        return false;
    }
    let direction = a.normal().cross(b.normal());
    if direction.norm() < TOLERANCE {
        return false;
    }
    let (Some(ia), Some(ib)) = (
        line_interval(a.vertices(), b.plane(), &direction),
        line_interval(b.vertices(), a.plane(), &direction),
    ) else {
        return false;
    };
    let lo = ia.0.max(ib.0);
    let hi = ia.1.min(ib.1);
    hi - lo > TOLERANCE * direction.norm()
}

fn straddles(points: &[Point3], plane: &Plane) -> bool {
    let mut front = false;
    let mut back = false;
    for p in points {
        match plane.side(p) {
            Side::Front => front = true,
            Side::Back => back = true,
            Side::On => {}
        }
    }
    front && back
}

/// At least one point lies on the plane or on each side of it.
fn reaches(points: &[Point3], plane: &Plane) -> bool {
    let mut front = false;
    let mut back = false;
    for p in points {
        match plane.side(p) {
            Side::Front => front = true,
            Side::Back => back = true,
            Side::On => return true,
        }
    }
    front && back
}

/// Projects the crossing points of a loop with `plane` onto `direction`.
fn line_interval(points: &[Point3], plane: &Plane, direction: &Vector3) -> Option<(f64, f64)> {
    let n = points.len();
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let da = plane.signed_distance(&a);
        let db = plane.signed_distance(&b);
        let crossing = if plane.side(&a) == Side::On {
            Some(a)
        } else if (da > 0.0) != (db > 0.0) && plane.side(&b) != Side::On {
            Some(a + (b - a) * (da / (da - db)))
        } else {
            None
        };
        if let Some(c) = crossing {
            let s = direction.dot(&c.coords);
            lo = lo.min(s);
            hi = hi.max(s);
        }
    }
    (lo <= hi).then_some((lo, hi))
}
