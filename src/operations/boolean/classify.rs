use crate::math::{Point3, Vector3, PLANE_TOLERANCE, TOLERANCE};
use crate::topology::{PointLocation, Polygon};

/// Classification of a point relative to a solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClassification {
    Inside,
    Outside,
    OnBoundary,
}

/// Distance from a polygon edge under which a ray hit is ambiguous.
const EDGE_TOLERANCE: f64 = 1e-6;

/// Classifies a point against the closed boundary formed by `polygons`.
///
/// Uses ray casting: shoots a ray from the point and counts face crossings.
/// Odd crossings = inside, even = outside. The ray directions are skewed off
/// the coordinate axes, since mould geometry is full of axis-aligned faces
/// and edges. If a ray grazes an edge or runs inside a face plane, the next
/// direction is tried.
#[must_use]
pub fn classify_point_in_polygons(point: &Point3, polygons: &[Polygon]) -> PointClassification {
    let directions = [
        Vector3::new(1.0, 0.31, 0.17).normalize(),
        Vector3::new(-0.23, 1.0, 0.41).normalize(),
        Vector3::new(0.37, -0.29, 1.0).normalize(),
        Vector3::new(-0.61, -0.47, -0.83).normalize(),
    ];

    for dir in &directions {
        if let RayCastResult::Clear(classification) = ray_cast_classify(point, dir, polygons) {
            return classification;
        }
    }

    tracing::debug!(?point, "every ray direction was degenerate, treating as outside");
    PointClassification::Outside
}

enum RayCastResult {
    Clear(PointClassification),
    Degenerate,
}

fn ray_cast_classify(point: &Point3, dir: &Vector3, polygons: &[Polygon]) -> RayCastResult {
    let mut crossings = 0u32;

    for poly in polygons {
        let plane = poly.plane();
        let distance = plane.signed_distance(point);
        let denom = plane.normal().dot(dir);

        if distance.abs() < PLANE_TOLERANCE
            && poly.locate_coplanar(point, EDGE_TOLERANCE) != PointLocation::Outside
        {
            return RayCastResult::Clear(PointClassification::OnBoundary);
        }
        if denom.abs() < TOLERANCE {
            if distance.abs() < PLANE_TOLERANCE {
                return RayCastResult::Degenerate;
            }
            continue;
        }

        let t = -distance / denom;
        if t <= 0.0 {
            continue;
        }
        let hit = point + dir * t;
        match poly.locate_coplanar(&hit, EDGE_TOLERANCE) {
            PointLocation::Inside => crossings += 1,
            PointLocation::OnEdge => return RayCastResult::Degenerate,
            PointLocation::Outside => {}
        }
    }

    if crossings % 2 == 1 {
        RayCastResult::Clear(PointClassification::Inside)
    } else {
        RayCastResult::Clear(PointClassification::Outside)
    }
}
