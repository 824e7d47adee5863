use crate::error::{OperationError, Result};
use crate::math::polygon_2d::{
    dedup_closed, distance_to_boundary, find_self_intersection, signed_area,
};
use crate::math::{Point2, Vector2, TOLERANCE};

/// Maximum miter distance as a multiple of `|distance|`. When the miter
/// extends further than this, a bevel (two points) is used instead.
const MITER_LIMIT: f64 = 4.0;

/// Offsets a closed 2D polygon with self-intersection trimming.
///
/// # Algorithm
///
/// 1. **Phase A**: Offset each edge along its outward normal
/// 2. **Phase B**: Build the raw offset loop by intersecting consecutive
///    offset lines, beveling corners whose miter is too long and dropping
///    edges that the offset turns around
/// 3. **Phase C**: Split the raw loop at self-intersections and keep the
///    piece whose winding matches the input
///
/// # Sign Convention
///
/// - Positive distance: grows the polygon
/// - Negative distance: shrinks it
///
/// The result is counter-clockwise regardless of the input winding.
#[derive(Debug)]
pub struct PolygonOffset2D {
    points: Vec<Point2>,
    distance: f64,
}

impl PolygonOffset2D {
    /// Creates a new polygon offset operation.
    #[must_use]
    pub fn new(points: Vec<Point2>, distance: f64) -> Self {
        Self { points, distance }
    }

    /// Executes the offset operation.
    ///
    /// # Errors
    ///
    /// - `OperationError::InvalidInput` if fewer than 3 distinct points are given
    ///   or the polygon has no area
    /// - `OperationError::Failed` if an inward offset consumes the polygon
    pub fn execute(&self) -> Result<Vec<Point2>> {
        let mut points = dedup_closed(&self.points, TOLERANCE);
        if points.len() < 3 {
            return Err(OperationError::InvalidInput(
                "at least 3 points are required for polygon offset".into(),
            )
            .into());
        }
        let area = signed_area(&points);
        if area.abs() < TOLERANCE {
            return Err(OperationError::InvalidInput("polygon has no area".into()).into());
        }
        if area < 0.0 {
            points.reverse();
        }
        if self.distance.abs() < TOLERANCE {
            return Ok(points);
        }

        // Phase A & B
        let raw = build_raw_offset(&points, self.distance)?;

        // Phase C
        let trimmed = trim_closed_loops(&raw);
        let result_area = signed_area(&trimmed);
        if trimmed.len() < 3 || result_area <= TOLERANCE {
            return Err(OperationError::Failed("offset collapsed".into()).into());
        }
        // Every surviving vertex must keep its distance from the input. A
        // vertex that came closer belongs to a feature the offset passed through.
        let clearance = self.distance.abs() * (1.0 - 1e-6) - 1e-9;
        if trimmed
            .iter()
            .any(|q| distance_to_boundary(q, &points) < clearance)
        {
            return Err(
                OperationError::Failed("offset collapsed (passed through itself)".into()).into(),
            );
        }
        Ok(trimmed)
    }
}

/// An input edge with its line moved out by the offset distance.
struct OffsetEdge {
    start: Point2,
    dir: Vector2,
    length: f64,
    moved_start: Point2,
    moved_end: Point2,
}

/// How the offset lines of two consecutive edges are joined.
enum Join {
    Miter(Point2),
    Bevel(Point2, Point2),
}

impl Join {
    fn first(&self) -> Point2 {
        match self {
            Self::Miter(p) | Self::Bevel(p, _) => *p,
        }
    }

    fn last(&self) -> Point2 {
        match self {
            Self::Miter(p) | Self::Bevel(_, p) => *p,
        }
    }
}

fn offset_edges(points: &[Point2], distance: f64) -> Vec<OffsetEdge> {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (start, end) = (points[i], points[(i + 1) % n]);
            let dir = end - start;
            let length = dir.norm();
            let outward = Vector2::new(dir.y, -dir.x) / length;
            OffsetEdge {
                start,
                dir,
                length,
                moved_start: start + outward * distance,
                moved_end: end + outward * distance,
            }
        })
        .collect()
}

/// Joins the offset line of `a` to that of the edge `b` following it. The
/// miter is beveled when it lands further than the miter limit from the
/// corner `b` starts at.
fn join(a: &OffsetEdge, b: &OffsetEdge, distance: f64) -> Join {
    match line_intersection(&a.moved_start, &a.dir, &b.moved_start, &b.dir) {
        Some(miter) if (miter - b.start).norm() <= MITER_LIMIT * distance.abs() => {
            Join::Miter(miter)
        }
        _ => Join::Bevel(a.moved_end, b.moved_start),
    }
}

/// Builds the untrimmed offset loop of a counter-clockwise polygon.
///
/// An edge shorter than the offset can come out running backwards between
/// its neighbours' joins. Such a fold never crosses the loop, so loop
/// trimming cannot remove it: the shortest reversed edge is dropped and its
/// neighbours joined directly until no edge runs backwards.
fn build_raw_offset(points: &[Point2], distance: f64) -> Result<Vec<Point2>> {
    let edges = offset_edges(points, distance);
    let mut active: Vec<usize> = (0..edges.len()).collect();
    loop {
        let k = active.len();
        if k < 3 {
            return Err(OperationError::Failed("offset collapsed".into()).into());
        }
        let joins: Vec<Join> = (0..k)
            .map(|i| join(&edges[active[(i + k - 1) % k]], &edges[active[i]], distance))
            .collect();
        let reversed = (0..k)
            .filter(|&i| {
                let run = joins[(i + 1) % k].first() - joins[i].last();
                run.dot(&edges[active[i]].dir) < 0.0
            })
            .min_by(|&i, &j| edges[active[i]].length.total_cmp(&edges[active[j]].length));
        match reversed {
            Some(i) => {
                active.remove(i);
            }
            None => {
                return Ok(joins
                    .into_iter()
                    .flat_map(|j| match j {
                        Join::Miter(p) => vec![p],
                        Join::Bevel(p, q) => vec![p, q],
                    })
                    .collect());
            }
        }
    }
}

/// Intersection of the lines `p1 + t * d1` and `p2 + u * d2`.
fn line_intersection(p1: &Point2, d1: &Vector2, p2: &Point2, d2: &Vector2) -> Option<Point2> {
    let cross = d1.perp(d2);
    if cross.abs() < TOLERANCE * d1.norm() * d2.norm() {
        return None;
    }
    let t = (p2 - p1).perp(d2) / cross;
    Some(p1 + d1 * t)
}

/// Splits a closed polygon at the crossing of edges `i` and `j` into two loops.
fn split_at_intersection(
    points: &[Point2],
    seg_i: usize,
    seg_j: usize,
    intersection: Point2,
) -> (Vec<Point2>, Vec<Point2>) {
    let n = points.len();

    let mut a = Vec::with_capacity(seg_j - seg_i + 1);
    a.push(intersection);
    a.extend_from_slice(&points[(seg_i + 1)..=seg_j]);

    let mut b = Vec::with_capacity(n - (seg_j - seg_i) + 1);
    b.push(intersection);
    let mut idx = (seg_j + 1) % n;
    loop {
        b.push(points[idx]);
        if idx == seg_i {
            break;
        }
        idx = (idx + 1) % n;
    }

    (a, b)
}

/// Recursively removes self-intersection loops from a closed polygon.
///
/// At each crossing the polygon splits in two; both halves are trimmed and the
/// counter-clockwise one with the larger area is kept. Loops created by
/// concave corners and collapsed features wind clockwise and are dropped.
/// Each split strictly reduces the vertex count, so recursion terminates.
fn trim_closed_loops(points: &[Point2]) -> Vec<Point2> {
    let pts = dedup_closed(points, TOLERANCE);
    if pts.len() < 4 {
        return pts;
    }
    match find_self_intersection(&pts) {
        None => pts,
        Some((i, j, pt)) => {
            let (a, b) = split_at_intersection(&pts, i, j, pt);
            let trimmed_a = trim_closed_loops(&a);
            let trimmed_b = trim_closed_loops(&b);
            let area_a = signed_area(&trimmed_a);
            let area_b = signed_area(&trimmed_b);
            match (area_a > 0.0, area_b > 0.0) {
                (true, false) => trimmed_a,
                (false, true) => trimmed_b,
                _ if area_a.abs() >= area_b.abs() => trimmed_a,
                _ => trimmed_b,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square() -> Vec<Point2> {
        vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)]
    }

    #[test]
    fn square_outward_offset() {
        let result = PolygonOffset2D::new(square(), 1.0).execute().unwrap();
        assert_eq!(result.len(), 4);
        assert_relative_eq!(signed_area(&result), 36.0, epsilon = 1e-9);
        assert!(result.contains(&p(-1.0, -1.0)));
    }

    #[test]
    fn clockwise_input_inward_offset() {
        let mut cw = square();
        cw.reverse();
        let result = PolygonOffset2D::new(cw, -1.0).execute().unwrap();
        assert_relative_eq!(signed_area(&result), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn short_edge_at_concave_corner_is_trimmed() {
        // An L-shaped step with a notch shorter than the offset distance.
        let notch = vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 10.0),
            p(6.0, 10.0),
            p(6.0, 9.5),
            p(5.5, 9.5),
            p(5.5, 10.0),
            p(0.0, 10.0),
        ];
        let result = PolygonOffset2D::new(notch, 2.0).execute().unwrap();
        assert!(find_self_intersection(&result).is_none());
        // The notch is swallowed: the top edge is flat at y = 12.
        assert!(result.iter().all(|q| q.y <= 12.0 + 1e-9));
        assert_relative_eq!(signed_area(&result), 14.0 * 14.0, epsilon = 1e-6);
    }

    #[test]
    fn edge_turned_around_at_concave_step_is_dropped() {
        // The short inward edge below the step is shorter than the offset.
        // Its offset runs backwards and would leave a fold at (12.4, 9.74).
        let step = vec![
            p(0.0, 0.0),
            p(10.0, 0.0),
            p(10.0, 9.5),
            p(9.9, 10.0),
            p(12.4, 10.0),
            p(12.4, 30.0),
            p(0.0, 30.0),
        ];
        let result = PolygonOffset2D::new(step, 2.4).execute().unwrap();
        assert_eq!(result.len(), 6);
        assert!(result.iter().any(|q| (q - p(12.4, 7.6)).norm() < 1e-9));
        assert!(result.iter().all(|q| q.y < 7.6 + 1e-9 || q.x > 14.8 - 1e-9 || q.y > 30.0));
        assert_relative_eq!(signed_area(&result), 17.2 * 34.8 - 2.4 * 10.0, epsilon = 1e-6);
    }

    #[test]
    fn sharp_corner_is_beveled() {
        let spike = vec![p(0.0, 0.0), p(10.0, 0.0), p(0.0, 1.0)];
        let result = PolygonOffset2D::new(spike, 1.0).execute().unwrap();
        let far = result.iter().map(|q| q.x).fold(f64::MIN, f64::max);
        assert!(far < 10.0 + 4.0 * 1.0 + 1e-9);
        assert!(result.len() > 3);
    }

    #[test]
    fn inward_collapse_fails() {
        let result = PolygonOffset2D::new(square(), -2.5).execute();
        assert!(result.is_err());
    }

    #[test]
    fn degenerate_input_fails() {
        assert!(PolygonOffset2D::new(vec![p(0.0, 0.0), p(1.0, 0.0)], 1.0)
            .execute()
            .is_err());
    }
}
