use crate::error::MouldError;
use crate::kernel::Kernel;
use crate::topology::SolidId;

use super::scope::Scope;

/// Grows a wall of `wall_thickness` outward from `solid`, opening its flat
/// top at `top_height`. The original surface becomes the cavity.
///
/// # Errors
///
/// `ShellFailure` if the kernel cannot build the wall.
pub fn shell_open_top<K: Kernel + ?Sized>(
    scope: &mut Scope<'_, K>,
    solid: SolidId,
    wall_thickness: f64,
    top_height: f64,
) -> Result<SolidId, MouldError> {
    tracing::debug!(wall_thickness, top_height, "shelling inner mould");
    scope.shell(solid, -wall_thickness, top_height)
}
