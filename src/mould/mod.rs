//! Slip-casting mould generation on top of the [`Kernel`](crate::kernel::Kernel).

mod builder;
mod extract;
mod features;
mod generate;
mod layout;
mod outer;
mod params;
mod profile;
mod scope;
mod shell;
mod split;
mod volume;

pub use extract::{ExportBlobs, MeshData};
pub use generate::{Engine, ExportedParts, PartError, PartGroup, PartKind, PartOutcome};
pub use layout::MouldLayout;
pub use params::{MouldParameters, SlipWellType, SplitCount, RING_CLEARANCE};
pub use profile::{
    extend_for_slip_well, scale_for_shrinkage, Profile, ProfileCoord, ProfilePoint, SegmentType,
};
pub use scope::{with_scope, Scope};
pub use split::{PieceKey, PieceSet};
pub use volume::{PlasterMix, VolumeReport};
