//! The mould generation engine.
//!
//! Each request runs inside one [`Scope`]: the proof model and inner mould
//! are built first and abort the request on failure; the outer mould and
//! ring are then attempted independently, so one failing leaves the other
//! parts intact.

use std::fmt;

use thiserror::Error;

use crate::config::{EngineConfig, Quality, Resolution};
use crate::error::MouldError;
use crate::kernel::{Kernel, MeshKernel};
use crate::tessellation::TessellationParams;
use crate::topology::SolidId;

use super::builder::build_and_revolve_open;
use super::extract::{to_export_blobs, to_mesh, ExportBlobs, MeshData};
use super::layout::MouldLayout;
use super::outer::{build_ring_blank, finish_ring, generate_outer_mould};
use super::params::MouldParameters;
use super::profile::{extend_for_slip_well, scale_for_shrinkage, Profile};
use super::scope::{with_scope, Scope};
use super::shell::shell_open_top;
use super::split::{PieceKey, PieceSet};
use super::volume::{cavity_volume, measure_volume, ring_volume_estimate, VolumeReport};

/// Groups of parts that are generated, and fail, together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartGroup {
    Outer,
    Ring,
}

impl PartGroup {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Outer => "outer",
            Self::Ring => "ring",
        }
    }
}

impl fmt::Display for PartGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one generated part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    /// The fired-size vessel.
    Proof,
    InnerMould,
    OuterPiece(PieceKey),
    RingPiece(PieceKey),
}

impl PartKind {
    /// Key of the part in wire-format part maps, e.g. `outer-front`.
    #[must_use]
    pub fn wire_key(self) -> String {
        match self {
            Self::Proof => "proof".to_string(),
            Self::InnerMould => "inner-mould".to_string(),
            Self::OuterPiece(key) => format!("outer-{key}"),
            Self::RingPiece(key) => format!("ring-{key}"),
        }
    }

    /// The isolated group this part belongs to, if any.
    #[must_use]
    pub fn group(self) -> Option<PartGroup> {
        match self {
            Self::Proof | Self::InnerMould => None,
            Self::OuterPiece(_) => Some(PartGroup::Outer),
            Self::RingPiece(_) => Some(PartGroup::Ring),
        }
    }

    fn in_group(group: PartGroup, key: PieceKey) -> Self {
        match group {
            PartGroup::Outer => Self::OuterPiece(key),
            PartGroup::Ring => Self::RingPiece(key),
        }
    }
}

/// Failure of an isolated part group.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{group} generation failed: {message}")]
pub struct PartError {
    pub group: PartGroup,
    pub message: String,
}

/// One generated part, or why it is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct PartOutcome<T> {
    pub kind: PartKind,
    pub result: Result<T, PartError>,
}

/// Files for every part plus the volumes of the exported mould.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedParts {
    pub parts: Vec<PartOutcome<ExportBlobs>>,
    pub volumes: VolumeReport,
}

/// Solids on the critical path of every request.
struct MouldCore {
    proof: SolidId,
    core: SolidId,
    inner: SolidId,
    layout: MouldLayout,
}

/// Generates mould parts on a [`Kernel`].
///
/// Every public operation leaves the kernel with no live solids.
pub struct Engine<K: Kernel = MeshKernel> {
    kernel: K,
    config: EngineConfig,
}

impl Engine<MeshKernel> {
    /// Creates an engine over a fresh faceted kernel.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_kernel(MeshKernel::new(), config)
    }
}

impl Default for Engine<MeshKernel> {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl<K: Kernel> Engine<K> {
    #[must_use]
    pub fn with_kernel(kernel: K, config: EngineConfig) -> Self {
        Self { kernel, config }
    }

    #[must_use]
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Live kernel heap in bytes, if the kernel reports it.
    #[must_use]
    pub fn heap_size(&self) -> Option<usize> {
        self.kernel.heap_size()
    }

    /// Revolves the profile as drawn, for preview.
    ///
    /// # Errors
    ///
    /// `InvalidProfile` for a bad profile, otherwise the kernel failure.
    pub fn revolve(&mut self, profile: &Profile) -> Result<MeshData, MouldError> {
        profile.validate()?;
        let params = *self.config.params(Quality::Preview);
        with_scope(&mut self.kernel, |scope| {
            let proof = build_and_revolve_open(scope, profile, &params)?;
            to_mesh(scope, proof, &params)
        })
    }

    /// Builds every part and tessellates it for preview.
    ///
    /// # Errors
    ///
    /// Invalid input, or a failure of the proof model or inner mould
    /// (`CriticalPart`). Outer mould and ring failures are reported per part.
    pub fn generate_mould(
        &mut self,
        profile: &Profile,
        params: &MouldParameters,
    ) -> Result<Vec<PartOutcome<MeshData>>, MouldError> {
        let tessellation = *self.config.params(Quality::Preview);
        with_scope(&mut self.kernel, |scope| {
            let core = build_core(scope, profile, params, &tessellation)?;
            let extract = Preview(tessellation);

            let mut parts = critical_parts(scope, &core, &extract)?;
            let outer = generate_outer_mould(scope, &core.layout, params, &tessellation);
            parts.extend(collect_group(scope, PartGroup::Outer, params, outer, &extract));
            let ring = build_ring_blank(scope, &core.layout, &tessellation).and_then(|blank| {
                finish_ring(scope, blank, &core.layout, params, &tessellation)
            });
            parts.extend(collect_group(scope, PartGroup::Ring, params, ring, &extract));
            Ok(parts)
        })
    }

    /// Measures the proof, inner mould and plaster cavity.
    ///
    /// # Errors
    ///
    /// Invalid input, a critical-path failure, or a failed measurement.
    pub fn calculate_volumes(
        &mut self,
        profile: &Profile,
        params: &MouldParameters,
    ) -> Result<VolumeReport, MouldError> {
        let tessellation = *self.config.params(Quality::Standard);
        with_scope(&mut self.kernel, |scope| {
            let core = build_core(scope, profile, params, &tessellation)?;
            let ring = build_ring_blank(scope, &core.layout, &tessellation);
            measure_volumes(scope, &core, ring.as_ref().ok().copied(), &tessellation)
        })
    }

    /// Builds every part at export resolution and encodes it as files.
    ///
    /// # Errors
    ///
    /// As [`Engine::generate_mould`], plus failed volume measurement.
    pub fn export_parts(
        &mut self,
        profile: &Profile,
        params: &MouldParameters,
        resolution: Resolution,
    ) -> Result<ExportedParts, MouldError> {
        let tessellation = *self.config.params(resolution.into());
        with_scope(&mut self.kernel, |scope| {
            let core = build_core(scope, profile, params, &tessellation)?;
            let extract = Files(tessellation);

            let mut parts = critical_parts(scope, &core, &extract)?;
            let outer = generate_outer_mould(scope, &core.layout, params, &tessellation);
            parts.extend(collect_group(scope, PartGroup::Outer, params, outer, &extract));

            let blank = build_ring_blank(scope, &core.layout, &tessellation);
            let volumes =
                measure_volumes(scope, &core, blank.as_ref().ok().copied(), &tessellation)?;
            let ring = blank.and_then(|blank| {
                finish_ring(scope, blank, &core.layout, params, &tessellation)
            });
            parts.extend(collect_group(scope, PartGroup::Ring, params, ring, &extract));
            Ok(ExportedParts { parts, volumes })
        })
    }
}

/// Turns a finished solid into the form a request returns.
trait Extract {
    type Output;

    fn extract<K: Kernel + ?Sized>(
        &self,
        scope: &mut Scope<'_, K>,
        solid: SolidId,
        kind: PartKind,
    ) -> Result<Self::Output, MouldError>;
}

/// Render buffers.
struct Preview(TessellationParams);

impl Extract for Preview {
    type Output = MeshData;

    fn extract<K: Kernel + ?Sized>(
        &self,
        scope: &mut Scope<'_, K>,
        solid: SolidId,
        _kind: PartKind,
    ) -> Result<MeshData, MouldError> {
        to_mesh(scope, solid, &self.0)
    }
}

/// STL and STEP files named after the part.
struct Files(TessellationParams);

impl Extract for Files {
    type Output = ExportBlobs;

    fn extract<K: Kernel + ?Sized>(
        &self,
        scope: &mut Scope<'_, K>,
        solid: SolidId,
        kind: PartKind,
    ) -> Result<ExportBlobs, MouldError> {
        to_export_blobs(scope, solid, &kind.wire_key(), &self.0)
    }
}

/// Builds the proof model and the shelled inner mould.
fn build_core<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    profile: &Profile,
    params: &MouldParameters,
    tessellation: &TessellationParams,
) -> Result<MouldCore, MouldError> {
    profile.validate()?;
    params.validate()?;

    let proof = build_and_revolve_open(scope, profile, tessellation)
        .map_err(|e| MouldError::critical("proof model", e))?;

    let scaled = scale_for_shrinkage(profile, params.shrinkage_rate);
    let extended = extend_for_slip_well(
        &scaled,
        params.wall_thickness,
        params.slip_well_type.height(),
    );
    let layout = MouldLayout::new(&extended.flatten(tessellation), params);
    let core = build_and_revolve_open(scope, &extended, tessellation)
        .map_err(|e| MouldError::critical("inner mould", e))?;
    let inner = shell_open_top(scope, core, params.wall_thickness, layout.top_z)
        .map_err(|e| MouldError::critical("inner mould", e))?;

    tracing::debug!(
        top_z = layout.top_z,
        base_z = layout.base_z,
        outer_radius = layout.outer_mould_outer_radius,
        "mould core built"
    );
    Ok(MouldCore {
        proof,
        core,
        inner,
        layout,
    })
}

fn critical_parts<K: Kernel + ?Sized, E: Extract>(
    scope: &mut Scope<'_, K>,
    core: &MouldCore,
    extract: &E,
) -> Result<Vec<PartOutcome<E::Output>>, MouldError> {
    let mut parts = Vec::new();
    for (kind, solid, name) in [
        (PartKind::Proof, core.proof, "proof model"),
        (PartKind::InnerMould, core.inner, "inner mould"),
    ] {
        let value = extract
            .extract(scope, solid, kind)
            .map_err(|e| MouldError::critical(name, e))?;
        parts.push(PartOutcome {
            kind,
            result: Ok(value),
        });
    }
    Ok(parts)
}

/// Extracts every piece of an isolated group. If building or extracting
/// any piece fails, every piece of the group reports the error.
fn collect_group<K: Kernel + ?Sized, E: Extract>(
    scope: &mut Scope<'_, K>,
    group: PartGroup,
    params: &MouldParameters,
    pieces: Result<PieceSet, MouldError>,
    extract: &E,
) -> Vec<PartOutcome<E::Output>> {
    let extracted = pieces.and_then(|pieces| {
        pieces
            .iter()
            .map(|(key, solid)| {
                let kind = PartKind::in_group(group, key);
                extract.extract(scope, solid, kind).map(|value| PartOutcome {
                    kind,
                    result: Ok(value),
                })
            })
            .collect::<Result<Vec<_>, _>>()
    });
    match extracted {
        Ok(parts) => parts,
        Err(err) => {
            tracing::warn!(%group, error = %err, "part group failed; continuing");
            let error = PartError {
                group,
                message: err.to_string(),
            };
            PieceKey::all(params.split_count)
                .iter()
                .map(|&key| PartOutcome {
                    kind: PartKind::in_group(group, key),
                    result: Err(error.clone()),
                })
                .collect()
        }
    }
}

fn measure_volumes<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    core: &MouldCore,
    ring: Option<SolidId>,
    tessellation: &TessellationParams,
) -> Result<VolumeReport, MouldError> {
    let proof_volume = measure_volume(scope, core.proof, tessellation)?;
    let inner_mould_volume = measure_volume(scope, core.inner, tessellation)?
        + measure_volume(scope, core.core, tessellation)?;
    let ring_volume = match ring {
        Some(ring) => measure_volume(scope, ring, tessellation)?,
        None => {
            tracing::warn!("ring unavailable; using its analytic volume");
            ring_volume_estimate(&core.layout)
        }
    };
    Ok(VolumeReport {
        proof_volume,
        inner_mould_volume,
        cavity_volume: cavity_volume(&core.layout, inner_mould_volume, ring_volume),
    })
}
