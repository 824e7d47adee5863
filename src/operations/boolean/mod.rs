mod assemble;
mod classify;
mod engine;
mod face_intersection;
mod select;
mod split;
mod subtract;
mod union;

pub use classify::{classify_point_in_polygons, PointClassification};
pub use face_intersection::polygons_intersect;
pub use select::BooleanOp;
pub use split::{Fragment, SolidSource};
pub use subtract::Subtract;
pub use union::Union;
