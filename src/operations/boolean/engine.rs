use crate::error::{OperationError, Result};
use crate::operations::query::Aabb;
use crate::topology::{Polygon, SolidData, SolidId, SolidStore};

use super::assemble::assemble_result;
use super::classify::classify_point_in_polygons;
use super::select::{should_keep_fragment, BooleanOp, KeepDecision};
use super::split::{split_polygon, Fragment, SolidSource};

/// Bounding-box slack used by the early-out and the per-face filter.
const BOUNDS_TOLERANCE: f64 = 1e-6;
/// Vertices closer than this are merged in the result.
const MERGE_TOLERANCE: f64 = 1e-7;

/// Executes a boolean operation on two solids.
///
/// Orchestrates the full pipeline: bounding-box early-out, splitting each
/// boundary against the other, centroid classification, selection, and
/// assembly. Operands are left untouched; the result is a new solid.
///
/// # Errors
///
/// Returns an error if either solid is missing or the result is empty.
pub fn boolean_execute(
    store: &mut SolidStore,
    solid_a: SolidId,
    solid_b: SolidId,
    op: BooleanOp,
) -> Result<SolidId> {
    let polys_a = store.solid(solid_a)?.polygons.clone();
    let polys_b = store.solid(solid_b)?.polygons.clone();

    // Step 1: AABB early-out
    let aabb_a = bounds_of(&polys_a);
    let aabb_b = bounds_of(&polys_b);
    if !aabb_a.overlaps(&aabb_b, BOUNDS_TOLERANCE) {
        return handle_disjoint(store, polys_a, polys_b, op);
    }

    // Step 2: split each boundary along the faces of the other solid
    let cutters_a = with_bounds(&polys_a);
    let cutters_b = with_bounds(&polys_b);
    let mut fragments: Vec<(Fragment, KeepDecision)> = Vec::new();

    for (source, own, other, cutters) in [
        (SolidSource::A, &polys_a, &polys_b, &cutters_b),
        (SolidSource::B, &polys_b, &polys_a, &cutters_a),
    ] {
        for polygon in own {
            for piece in split_polygon(polygon, cutters, BOUNDS_TOLERANCE) {
                // Step 3: classify each piece by its centroid
                let classification = classify_point_in_polygons(&piece.centroid(), other);
                let decision = should_keep_fragment(source, classification, op);
                fragments.push((
                    Fragment {
                        polygon: piece,
                        source,
                    },
                    decision,
                ));
            }
        }
    }

    tracing::debug!(
        ?op,
        faces_a = polys_a.len(),
        faces_b = polys_b.len(),
        fragments = fragments.len(),
        "boolean fragments classified"
    );

    // Step 4: select and assemble
    let kept_count = fragments
        .iter()
        .filter(|(_, d)| *d != KeepDecision::Discard)
        .count();
    if kept_count == 0 {
        return Err(
            OperationError::Failed("boolean operation produced empty result".into()).into(),
        );
    }

    let data = assemble_result(fragments, MERGE_TOLERANCE)?;
    Ok(store.add_solid(data))
}

fn bounds_of(polygons: &[Polygon]) -> Aabb {
    polygons
        .iter()
        .fold(Aabb::empty(), |acc, p| acc.merged(&p.aabb()))
}

fn with_bounds(polygons: &[Polygon]) -> Vec<(Polygon, Aabb)> {
    polygons.iter().map(|p| (p.clone(), p.aabb())).collect()
}

/// Handles the case where solids are disjoint (AABBs don't overlap).
fn handle_disjoint(
    store: &mut SolidStore,
    polys_a: Vec<Polygon>,
    polys_b: Vec<Polygon>,
    op: BooleanOp,
) -> Result<SolidId> {
    match op {
        BooleanOp::Union => {
            let mut polygons = polys_a;
            polygons.extend(polys_b);
            Ok(store.add_solid(SolidData::new(polygons)))
        }
        BooleanOp::Subtract => Ok(store.add_solid(SolidData::new(polys_a))),
    }
}
