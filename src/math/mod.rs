pub mod bezier;
pub mod plane;
pub mod polygon_2d;

pub use plane::{Plane, Side};

/// 2D point type. In profile space `x` is the radius and `y` the height.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance below which a point is treated as lying on a plane.
///
/// Models are in millimetres, so this is far below printable detail but
/// well above accumulated rounding from boolean splitting.
pub const PLANE_TOLERANCE: f64 = 1e-7;
