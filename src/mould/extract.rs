use serde::{Deserialize, Serialize};

use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::tessellation::{TessellationParams, TriangleMesh};
use crate::topology::SolidId;

use super::scope::Scope;

/// Flat render buffers: three floats per vertex, three indices per triangle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeshData {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

impl From<&TriangleMesh> for MeshData {
    #[allow(clippy::cast_possible_truncation)]
    fn from(mesh: &TriangleMesh) -> Self {
        Self {
            positions: mesh
                .vertices
                .iter()
                .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
                .collect(),
            normals: mesh
                .normals
                .iter()
                .flat_map(|n| [n.x as f32, n.y as f32, n.z as f32])
                .collect(),
            indices: mesh.indices.iter().flatten().copied().collect(),
        }
    }
}

/// Downloadable files for one part. Bytes travel as base64 on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExportBlobs {
    #[serde(with = "base64_bytes")]
    pub stl: Vec<u8>,
    /// Absent when the STEP writer failed for this part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD.decode(text).map_err(serde::de::Error::custom)
    }
}

/// Tessellates a solid into render buffers.
///
/// # Errors
///
/// `KernelException` if tessellation fails.
pub fn to_mesh<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    solid: SolidId,
    params: &TessellationParams,
) -> Result<MeshData, MouldError> {
    let mesh = scope.tessellate(solid, params)?;
    Ok(MeshData::from(&mesh))
}

/// Produces the STL and, on a best-effort basis, the STEP file for a part.
///
/// # Errors
///
/// `KernelException` if the STL cannot be produced. STEP failures are
/// logged and leave `step` empty.
pub fn to_export_blobs<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    solid: SolidId,
    name: &str,
    params: &TessellationParams,
) -> Result<ExportBlobs, MouldError> {
    let stl = scope.export_stl(solid, params)?;
    let step = match scope.export_step(solid, name) {
        Ok(text) => Some(text),
        Err(err) => {
            tracing::warn!(part = name, error = %err, "STEP export failed; STL only");
            None
        }
    };
    Ok(ExportBlobs { stl, step })
}
