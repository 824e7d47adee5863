mod make_box;
mod make_cylinder;

pub use make_box::MakeBox;
pub use make_cylinder::MakeCylinder;

/// Rounds a segment count up to a multiple of four (at least eight).
///
/// Multiples of four keep a half-step angular offset symmetric about both
/// coordinate planes through the axis.
#[must_use]
pub fn round_segments(segments: u32) -> u32 {
    segments.max(8).div_ceil(4) * 4
}
