use std::collections::HashMap;

use crate::math::{Point2, Point3};

use super::Polygon;

slotmap::new_key_type! {
    /// Handle to a solid in the kernel arena.
    pub struct SolidId;
}

/// The generating section of a solid of revolution.
#[derive(Debug, Clone)]
pub struct Revolution {
    /// Closed counter-clockwise section in `(r, z)` coordinates.
    pub section: Vec<Point2>,
    /// Angular segment count used for the facets.
    pub segments: u32,
}

/// Data associated with a solid: a closed boundary of planar polygons.
#[derive(Debug, Clone, Default)]
pub struct SolidData {
    /// Boundary faces with outward-facing winding.
    pub polygons: Vec<Polygon>,
    /// Set when the solid was produced by revolving a section about the z axis.
    pub revolution: Option<Revolution>,
}

impl SolidData {
    /// Creates a solid from its boundary polygons.
    #[must_use]
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self {
            polygons,
            revolution: None,
        }
    }

    /// Creates a solid of revolution that remembers its section.
    #[must_use]
    pub fn revolved(polygons: Vec<Polygon>, revolution: Revolution) -> Self {
        Self {
            polygons,
            revolution: Some(revolution),
        }
    }

    /// Returns `true` when the solid has no faces.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Counts directed edges that are not matched by a reverse twin.
    ///
    /// A closed, consistently wound boundary has none. Corners are compared
    /// exactly, which holds for kernel output since assembly welds them.
    #[must_use]
    pub fn open_edges(&self) -> usize {
        let mut edges: HashMap<([u64; 3], [u64; 3]), usize> = HashMap::new();
        for polygon in &self.polygons {
            let v = polygon.vertices();
            for (i, a) in v.iter().enumerate() {
                let b = &v[(i + 1) % v.len()];
                *edges.entry((corner_key(a), corner_key(b))).or_default() += 1;
            }
        }
        edges
            .iter()
            .map(|(&(a, b), &count)| {
                let twins = edges.get(&(b, a)).copied().unwrap_or(0);
                count.saturating_sub(twins)
            })
            .sum()
    }

    /// Bytes held by the boundary representation.
    #[must_use]
    pub fn heap_bytes(&self) -> usize {
        let section = self
            .revolution
            .as_ref()
            .map_or(0, |r| r.section.capacity() * std::mem::size_of::<Point2>());
        std::mem::size_of::<Self>()
            + section
            + self.polygons.iter().map(Polygon::heap_bytes).sum::<usize>()
            + (self.polygons.capacity() - self.polygons.len()) * std::mem::size_of::<Polygon>()
    }
}

/// Bit pattern of a corner, with negative zero folded onto zero.
fn corner_key(p: &Point3) -> [u64; 3] {
    [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()]
}
