use crate::error::ExportError;
use crate::math::Vector3;
use crate::tessellation::TriangleMesh;

const HEADER: &[u8] = b"slipcast binary STL";
const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Encodes a mesh as binary STL.
///
/// Facet normals are recomputed from the winding; degenerate triangles get
/// a zero normal, which readers treat as "derive from vertices".
///
/// # Errors
///
/// Returns `ExportError::Empty` for a mesh without triangles and
/// `ExportError::TooManyTriangles` when the count does not fit the header.
#[allow(clippy::cast_possible_truncation)]
pub fn write_stl(mesh: &TriangleMesh) -> Result<Vec<u8>, ExportError> {
    if mesh.is_empty() {
        return Err(ExportError::Empty);
    }
    let count = u32::try_from(mesh.triangle_count())
        .map_err(|_| ExportError::TooManyTriangles(mesh.triangle_count()))?;

    let mut data = Vec::with_capacity(HEADER_LEN + 4 + mesh.triangle_count() * TRIANGLE_LEN);
    data.extend_from_slice(HEADER);
    data.resize(HEADER_LEN, b' ');
    data.extend_from_slice(&count.to_le_bytes());

    for i in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(i);
        let normal = (b - a).cross(&(c - a)).try_normalize(1e-12).unwrap_or_else(Vector3::zeros);
        for value in normal.iter() {
            data.extend_from_slice(&(*value as f32).to_le_bytes());
        }
        for corner in [a, b, c] {
            for value in corner.coords.iter() {
                data.extend_from_slice(&(*value as f32).to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(data)
}
