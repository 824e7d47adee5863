//! Interchange file writers.
//!
//! Binary STL is written from a tessellated [`TriangleMesh`]; STEP is written
//! straight from the solid's planar polygons as an AP214 faceted B-rep.
//!
//! [`TriangleMesh`]: crate::tessellation::TriangleMesh

mod step;
mod stl;

pub use step::write_step;
pub use stl::write_stl;
