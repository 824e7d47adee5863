use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::math::Point3;
use crate::topology::{Polygon, SolidData};

use super::select::KeepDecision;
use super::split::Fragment;

/// Fragments smaller than this are cut debris and are dropped.
const MIN_FRAGMENT_AREA: f64 = 1e-9;

/// Assembles a solid from the kept fragments.
///
/// Vertices closer than the merge tolerance are snapped onto one another so
/// that fragments cut from neighbouring faces share their corners exactly.
/// A corner that lands inside a neighbour's edge is then inserted into that
/// edge, so every directed edge of the result meets its reverse twin.
///
/// # Errors
///
/// Returns an error if no fragment survives.
pub fn assemble_result(
    fragments: Vec<(Fragment, KeepDecision)>,
    merge_tolerance: f64,
) -> Result<SolidData> {
    let mut merger = VertexMerger::new(merge_tolerance);
    let mut polygons = Vec::with_capacity(fragments.len());

    for (fragment, decision) in fragments {
        let polygon = match decision {
            KeepDecision::Discard => continue,
            KeepDecision::Keep => fragment.polygon,
            KeepDecision::KeepFlipped => fragment.polygon.flipped(),
        };

        let mut vertices: Vec<Point3> = Vec::with_capacity(polygon.vertices().len());
        for v in polygon.vertices() {
            let snapped = merger.snap(v);
            if vertices.last() != Some(&snapped) {
                vertices.push(snapped);
            }
        }
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            continue;
        }
        let snapped = Polygon::with_plane(vertices, *polygon.plane());
        if snapped.area() < MIN_FRAGMENT_AREA {
            continue;
        }
        polygons.push(snapped);
    }

    if polygons.is_empty() {
        return Err(OperationError::Failed("boolean operation produced no faces".into()).into());
    }
    Ok(SolidData::new(conform_edges(polygons, merge_tolerance)))
}

/// Splits edges at the corners of neighbouring polygons that lie on them.
fn conform_edges(polygons: Vec<Polygon>, tolerance: f64) -> Vec<Polygon> {
    let index = AxisIndex::new(&polygons);
    polygons
        .into_iter()
        .map(|polygon| {
            let v = polygon.vertices();
            let n = v.len();
            let mut points = Vec::with_capacity(n);
            let mut inserted = false;
            for i in 0..n {
                let (a, b) = (v[i], v[(i + 1) % n]);
                points.push(a);
                let edge = b - a;
                let length = edge.norm();
                if length <= 2.0 * tolerance {
                    continue;
                }
                let dir = edge / length;
                let mut on_edge: Vec<(f64, Point3)> = index
                    .candidates(&a, &b, tolerance)
                    .iter()
                    .filter_map(|q| {
                        let t = dir.dot(&(q - a));
                        if t < tolerance || t > length - tolerance {
                            return None;
                        }
                        let offset = ((q - a) - dir * t).norm();
                        (offset < tolerance).then_some((t, *q))
                    })
                    .collect();
                if on_edge.is_empty() {
                    continue;
                }
                on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
                points.extend(on_edge.into_iter().map(|(_, q)| q));
                inserted = true;
            }
            if inserted {
                Polygon::with_plane(points, *polygon.plane())
            } else {
                polygon
            }
        })
        .collect()
}

/// Distinct corners of a polygon set, sorted along each coordinate axis.
struct AxisIndex {
    sorted: [Vec<Point3>; 3],
}

impl AxisIndex {
    fn new(polygons: &[Polygon]) -> Self {
        let mut points: Vec<Point3> = polygons
            .iter()
            .flat_map(|p| p.vertices().iter().copied())
            .collect();
        points.sort_by(|p, q| {
            p.x.total_cmp(&q.x)
                .then(p.y.total_cmp(&q.y))
                .then(p.z.total_cmp(&q.z))
        });
        points.dedup();
        let sorted = [0, 1, 2].map(|axis| {
            let mut column = points.clone();
            column.sort_by(|p, q| p[axis].total_cmp(&q[axis]));
            column
        });
        Self { sorted }
    }

    /// Corners within the segment's range along its narrowest axis.
    fn candidates(&self, a: &Point3, b: &Point3, tolerance: f64) -> &[Point3] {
        let extent = b - a;
        let axis = (0..3)
            .min_by(|&i, &j| extent[i].abs().total_cmp(&extent[j].abs()))
            .unwrap_or(0);
        let lo = a[axis].min(b[axis]) - tolerance;
        let hi = a[axis].max(b[axis]) + tolerance;
        let column = &self.sorted[axis];
        let start = column.partition_point(|p| p[axis] < lo);
        let end = column.partition_point(|p| p[axis] <= hi);
        &column[start..end.max(start)]
    }
}

/// Spatial hash that maps nearby points onto the first one seen.
struct VertexMerger {
    cell: f64,
    points: HashMap<[i64; 3], Point3>,
}

impl VertexMerger {
    fn new(tolerance: f64) -> Self {
        Self {
            cell: tolerance,
            points: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, p: &Point3) -> [i64; 3] {
        [
            (p.x / self.cell).round() as i64,
            (p.y / self.cell).round() as i64,
            (p.z / self.cell).round() as i64,
        ]
    }

    fn snap(&mut self, p: &Point3) -> Point3 {
        *self.points.entry(self.key(p)).or_insert(*p)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::Polygon;

    use super::super::split::SolidSource;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn fragment(points: Vec<Point3>) -> Fragment {
        Fragment {
            polygon: Polygon::new(points).unwrap(),
            source: SolidSource::A,
        }
    }

    #[test]
    fn discarded_and_sliver_fragments_are_dropped() {
        let kept = fragment(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        let gone = fragment(vec![p(0.0, 0.0, 1.0), p(1.0, 0.0, 1.0), p(0.0, 1.0, 1.0)]);
        let sliver = fragment(vec![
            p(0.0, 0.0, 2.0),
            p(1.0, 0.0, 2.0),
            p(1.0, 1e-9, 2.0),
        ]);
        let solid = assemble_result(
            vec![
                (kept, KeepDecision::KeepFlipped),
                (gone, KeepDecision::Discard),
                (sliver, KeepDecision::Keep),
            ],
            1e-9,
        )
        .unwrap();
        assert_eq!(solid.polygons.len(), 1);
        assert!(solid.polygons[0].normal().z < 0.0);
    }

    #[test]
    fn nothing_kept_is_an_error() {
        let only = fragment(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)]);
        assert!(assemble_result(vec![(only, KeepDecision::Discard)], 1e-9).is_err());
    }

    #[test]
    fn corners_on_a_neighbour_edge_are_inserted() {
        // A unit square beside two half-height squares: their shared corner
        // at (1, 0.5) sits inside the big square's right edge.
        let big = fragment(vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(1.0, 1.0, 0.0), p(0.0, 1.0, 0.0)]);
        let low = fragment(vec![p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0), p(2.0, 0.5, 0.0), p(1.0, 0.5, 0.0)]);
        let high = fragment(vec![p(1.0, 0.5, 0.0), p(2.0, 0.5, 0.0), p(2.0, 1.0, 0.0), p(1.0, 1.0, 0.0)]);
        let solid = assemble_result(
            vec![
                (big, KeepDecision::Keep),
                (low, KeepDecision::Keep),
                (high, KeepDecision::Keep),
            ],
            1e-7,
        )
        .unwrap();
        let big = &solid.polygons[0];
        assert_eq!(big.vertices().len(), 5);
        assert_eq!(big.vertices()[2], p(1.0, 0.5, 0.0));
        assert!((big.area() - 1.0).abs() < 1e-12);
        assert_eq!(solid.polygons[1].vertices().len(), 4);
    }
}
