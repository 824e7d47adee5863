use crate::error::Result;
use crate::math::{Plane, Point3, Side, Vector3, PLANE_TOLERANCE};
use crate::operations::query::Aabb;

/// A planar convex polygon with outward-facing winding.
///
/// Polygons are the faces of the faceted kernel. Every operation keeps them
/// convex: primitives only emit triangles, trapezoids and regular n-gons, and
/// splitting a convex polygon by a plane yields convex pieces.
#[derive(Debug, Clone)]
pub struct Polygon {
    vertices: Vec<Point3>,
    plane: Plane,
}

/// Result of splitting a polygon by a plane.
#[derive(Debug, Clone)]
pub enum PolygonSplit {
    /// The polygon lies in the plane; `Side` tells whether its normal agrees
    /// (`Front`) or opposes (`Back`) the plane normal.
    Coplanar(Side),
    Front,
    Back,
    Spanning { front: Polygon, back: Polygon },
}

/// Location of a coplanar point relative to a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    OnEdge,
    Outside,
}

impl Polygon {
    /// Creates a polygon, fitting its plane from the vertex loop.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is degenerate (fewer than three vertices
    /// or zero area).
    pub fn new(vertices: Vec<Point3>) -> Result<Self> {
        let plane = Plane::from_loop(&vertices)?;
        Ok(Self { vertices, plane })
    }

    /// Creates a polygon that inherits a known supporting plane.
    ///
    /// Used for split fragments so repeated splitting never drifts the plane.
    #[must_use]
    pub fn with_plane(vertices: Vec<Point3>, plane: Plane) -> Self {
        Self { vertices, plane }
    }

    /// Returns the vertex loop.
    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    /// Returns the supporting plane.
    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the outward unit normal.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        self.plane.normal()
    }

    /// Returns the polygon with reversed winding and normal.
    #[must_use]
    pub fn flipped(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self {
            vertices,
            plane: self.plane.flipped(),
        }
    }

    /// Vertex average of the loop. For convex polygons this lies inside.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        let sum: Vector3 = self.vertices.iter().map(|p| p.coords).sum();
        #[allow(clippy::cast_precision_loss)]
        Point3::from(sum / self.vertices.len().max(1) as f64)
    }

    /// Area of the polygon.
    #[must_use]
    pub fn area(&self) -> f64 {
        let Some(first) = self.vertices.first() else {
            return 0.0;
        };
        let mut twice = Vector3::zeros();
        for pair in self.vertices[1..].windows(2) {
            twice += (pair[0] - first).cross(&(pair[1] - first));
        }
        twice.norm() * 0.5
    }

    /// Axis-aligned bounds of the vertex loop.
    #[must_use]
    pub fn aabb(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter())
    }

    /// Bytes held by this polygon, including its vertex buffer.
    #[must_use]
    pub fn heap_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.vertices.capacity() * std::mem::size_of::<Point3>()
    }

    /// Splits the polygon by a plane.
    #[must_use]
    pub fn split(&self, plane: &Plane) -> PolygonSplit {
        let sides: Vec<Side> = self.vertices.iter().map(|p| plane.side(p)).collect();
        let has_front = sides.contains(&Side::Front);
        let has_back = sides.contains(&Side::Back);

        match (has_front, has_back) {
            (false, false) => {
                if self.plane.normal().dot(plane.normal()) > 0.0 {
                    PolygonSplit::Coplanar(Side::Front)
                } else {
                    PolygonSplit::Coplanar(Side::Back)
                }
            }
            (true, false) => PolygonSplit::Front,
            (false, true) => PolygonSplit::Back,
            (true, true) => {
                let n = self.vertices.len();
                let mut front = Vec::with_capacity(n + 1);
                let mut back = Vec::with_capacity(n + 1);
                for i in 0..n {
                    let j = (i + 1) % n;
                    let (vi, vj) = (self.vertices[i], self.vertices[j]);
                    let (si, sj) = (sides[i], sides[j]);
                    if si != Side::Back {
                        front.push(vi);
                    }
                    if si != Side::Front {
                        back.push(vi);
                    }
                    if (si == Side::Front && sj == Side::Back)
                        || (si == Side::Back && sj == Side::Front)
                    {
                        let di = plane.signed_distance(&vi);
                        let dj = plane.signed_distance(&vj);
                        let t = di / (di - dj);
                        let cut = vi + (vj - vi) * t;
                        front.push(cut);
                        back.push(cut);
                    }
                }
                PolygonSplit::Spanning {
                    front: Self::with_plane(front, self.plane),
                    back: Self::with_plane(back, self.plane),
                }
            }
        }
    }

    /// Locates a point lying in the polygon's plane.
    ///
    /// Assumes convexity: the point is inside when it is on the inner side
    /// of every edge.
    #[must_use]
    pub fn locate_coplanar(&self, point: &Point3, edge_tolerance: f64) -> PointLocation {
        let normal = self.plane.normal();
        let n = self.vertices.len();
        let mut on_edge = false;
        for i in 0..n {
            let a = self.vertices[i];
            let b = self.vertices[(i + 1) % n];
            let edge = b - a;
            let len = edge.norm();
            if len < PLANE_TOLERANCE {
                continue;
            }
            let inward = normal.cross(&edge) / len;
            let d = inward.dot(&(point - a));
            if d < -edge_tolerance {
                return PointLocation::Outside;
            }
            if d < edge_tolerance {
                on_edge = true;
            }
        }
        if on_edge {
            PointLocation::OnEdge
        } else {
            PointLocation::Inside
        }
    }

    /// Splits a polygon with more than three vertices into a triangle fan
    /// when its vertices stray from the fitted plane.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is degenerate.
    pub fn planar_pieces(vertices: Vec<Point3>) -> Result<Vec<Self>> {
        let polygon = Self::new(vertices)?;
        let planar = polygon
            .vertices
            .iter()
            .all(|p| polygon.plane.signed_distance(p).abs() < PLANE_TOLERANCE);
        if planar || polygon.vertices.len() == 3 {
            return Ok(vec![polygon]);
        }
        let v = &polygon.vertices;
        let mut pieces = Vec::with_capacity(v.len() - 2);
        for i in 1..v.len() - 1 {
            if let Ok(tri) = Self::new(vec![v[0], v[i], v[i + 1]]) {
                pieces.push(tri);
            }
        }
        Ok(pieces)
    }
}
