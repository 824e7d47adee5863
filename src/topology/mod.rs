pub mod polygon;
pub mod solid;

pub use polygon::{PointLocation, Polygon, PolygonSplit};
pub use solid::{Revolution, SolidData, SolidId};

use crate::error::TopologyError;
use slotmap::SlotMap;

/// Arena that owns every live solid.
///
/// Solids are addressed by generational [`SolidId`] handles, so a released
/// handle can never alias a later solid. The store keeps a running count of
/// the bytes held by live solids.
#[derive(Debug, Default)]
pub struct SolidStore {
    solids: SlotMap<SolidId, SolidData>,
    heap_bytes: usize,
}

impl SolidStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a solid and returns its ID.
    pub fn add_solid(&mut self, data: SolidData) -> SolidId {
        self.heap_bytes += data.heap_bytes();
        self.solids.insert(data)
    }

    /// Returns a reference to the solid data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid was never created or is already released.
    pub fn solid(&self, id: SolidId) -> Result<&SolidData, TopologyError> {
        self.solids
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("solid".into()))
    }

    /// Removes a solid, returning its data.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid was never created or is already released.
    pub fn remove_solid(&mut self, id: SolidId) -> Result<SolidData, TopologyError> {
        let data = self
            .solids
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("solid".into()))?;
        self.heap_bytes = self.heap_bytes.saturating_sub(data.heap_bytes());
        Ok(data)
    }

    /// Number of live solids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.solids.len()
    }

    /// Returns `true` when no solid is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Bytes held by live solids; zero when the store is empty.
    #[must_use]
    pub fn heap_bytes(&self) -> usize {
        if self.solids.is_empty() {
            0
        } else {
            self.heap_bytes
        }
    }
}
