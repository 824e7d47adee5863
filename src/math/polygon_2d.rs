use super::{Point2, Vector2, TOLERANCE};

/// Signed area of a closed 2D polygon (shoelace formula).
///
/// Positive for counter-clockwise winding.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

/// Removes consecutive duplicate points, including a duplicated closing point.
#[must_use]
pub fn dedup_closed(points: &[Point2], tolerance: f64) -> Vec<Point2> {
    let mut out: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if out.last().map_or(true, |last| (p - last).norm() > tolerance) {
            out.push(*p);
        }
    }
    while out.len() > 1 {
        let (first, last) = (out[0], out[out.len() - 1]);
        if (first - last).norm() > tolerance {
            break;
        }
        out.pop();
    }
    out
}

/// Clips a closed polygon to the half-plane `normal · p <= offset`.
///
/// Sutherland-Hodgman against a single edge. Points created on the clip line
/// are snapped onto it exactly when the normal is axis-aligned.
#[must_use]
pub fn clip_half_plane(points: &[Point2], normal: &Vector2, offset: f64) -> Vec<Point2> {
    let n = points.len();
    let mut out = Vec::with_capacity(n + 2);
    let inside = |p: &Point2| normal.dot(&p.coords) <= offset + TOLERANCE;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let (a_in, b_in) = (inside(&a), inside(&b));
        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let da = normal.dot(&a.coords) - offset;
            let db = normal.dot(&b.coords) - offset;
            let mut cut = a + (b - a) * (da / (da - db));
            if normal.y.abs() < TOLERANCE {
                cut.x = offset / normal.x;
            } else if normal.x.abs() < TOLERANCE {
                cut.y = offset / normal.y;
            }
            out.push(cut);
        }
    }
    dedup_closed(&out, TOLERANCE)
}

/// Distance from `point` to the boundary of a closed polygon.
#[must_use]
pub fn distance_to_boundary(point: &Point2, polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let a = polygon[i];
            let ab = polygon[(i + 1) % n] - a;
            let len_sq = ab.norm_squared();
            let t = if len_sq < TOLERANCE * TOLERANCE {
                0.0
            } else {
                ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0)
            };
            (point - (a + ab * t)).norm()
        })
        .fold(f64::INFINITY, f64::min)
}

/// Bounded segment-segment intersection.
///
/// Returns `(point, t, u)` with `t`, `u` the parameters along each segment.
#[must_use]
pub fn segment_intersection(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let cross = da.perp(&db);
    if cross.abs() < TOLERANCE {
        return None;
    }
    let d = b0 - a0;
    let t = d.perp(&db) / cross;
    let u = d.perp(&da) / cross;
    let eps = TOLERANCE;
    if (-eps..=1.0 + eps).contains(&t) && (-eps..=1.0 + eps).contains(&u) {
        let t = t.clamp(0.0, 1.0);
        Some((a0 + da * t, t, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Finds the first crossing between non-adjacent edges of a closed polygon.
///
/// Endpoint-to-endpoint touches are ignored. Returns `(i, j, point)` with
/// `i < j` the indices of the crossing edges.
#[must_use]
pub fn find_self_intersection(points: &[Point2]) -> Option<(usize, usize, Point2)> {
    let n = points.len();
    if n < 4 {
        return None;
    }
    let eps = 1e-8;
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if let Some((pt, t, u)) = segment_intersection(
                &points[i],
                &points[(i + 1) % n],
                &points[j],
                &points[(j + 1) % n],
            ) {
                let t_at_end = t < eps || t > 1.0 - eps;
                let u_at_end = u < eps || u > 1.0 - eps;
                if t_at_end && u_at_end {
                    continue;
                }
                return Some((i, j, pt));
            }
        }
    }
    None
}
