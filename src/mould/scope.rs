//! Scoped ownership of kernel solids.
//!
//! Every solid the engine creates is tracked by the [`Scope`] it was created
//! through and released when that scope is dropped, whether the closure
//! returned, bailed out with `?`, or unwound. Kernel errors are converted to
//! [`MouldError`] kinds here, at the call site.

use crate::error::{KernelError, MouldError};
use crate::kernel::Kernel;
use crate::math::{Point2, Point3, Vector3};
use crate::operations::query::Aabb;
use crate::tessellation::{TessellationParams, TriangleMesh};
use crate::topology::SolidId;

/// Runs `f` with a fresh scope over `kernel`; all solids tracked by the
/// scope are released when `f` finishes.
///
/// # Errors
///
/// Returns whatever `f` returns.
pub fn with_scope<K, T, F>(kernel: &mut K, f: F) -> Result<T, MouldError>
where
    K: Kernel + ?Sized,
    F: FnOnce(&mut Scope<'_, K>) -> Result<T, MouldError>,
{
    let mut scope = Scope::new(kernel);
    f(&mut scope)
}

/// Tracks the solids created during one unit of work.
pub struct Scope<'k, K: Kernel + ?Sized> {
    kernel: &'k mut K,
    tracked: Vec<SolidId>,
}

#[derive(Clone, Copy)]
enum Stage {
    Shell,
    Boolean,
    Other,
}

fn normalize(stage: Stage, err: KernelError) -> MouldError {
    match (stage, err) {
        (_, err @ KernelError::Panicked(_)) | (Stage::Other, err) => {
            MouldError::KernelException(err)
        }
        (Stage::Shell, err) => MouldError::ShellFailure(err),
        (Stage::Boolean, err) => MouldError::BooleanOperationFailure(err),
    }
}

impl<'k, K: Kernel + ?Sized> Scope<'k, K> {
    pub fn new(kernel: &'k mut K) -> Self {
        Self {
            kernel,
            tracked: Vec::new(),
        }
    }

    /// Takes ownership of `solid`; it is released when the scope ends.
    pub fn track(&mut self, solid: SolidId) -> SolidId {
        self.tracked.push(solid);
        solid
    }

    /// Releases a tracked solid now, so the scope does not release it again.
    pub fn dispose(&mut self, solid: SolidId) {
        let Some(index) = self.tracked.iter().rposition(|&id| id == solid) else {
            tracing::warn!(?solid, "dispose of a solid this scope does not own");
            return;
        };
        self.tracked.remove(index);
        if let Err(err) = self.kernel.release(solid) {
            tracing::warn!(?solid, error = %err, "failed to release solid");
        }
    }

    /// Number of solids currently owned by the scope.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.tracked.len()
    }

    /// Direct access to the kernel for queries that allocate nothing.
    pub fn kernel(&mut self) -> &mut K {
        &mut *self.kernel
    }

    fn tracked_result(
        &mut self,
        stage: Stage,
        result: crate::error::Result<SolidId>,
    ) -> Result<SolidId, MouldError> {
        result.map(|id| self.track(id)).map_err(|e| normalize(stage, e))
    }

    /// # Errors
    ///
    /// `KernelException` if the kernel cannot revolve the section.
    pub fn revolve(&mut self, section: &[Point2], segments: u32) -> Result<SolidId, MouldError> {
        let result = self.kernel.revolve(section, segments);
        self.tracked_result(Stage::Other, result)
    }

    /// # Errors
    ///
    /// `KernelException` if the box is degenerate.
    pub fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId, MouldError> {
        let result = self.kernel.make_box(min, max);
        self.tracked_result(Stage::Other, result)
    }

    /// # Errors
    ///
    /// `KernelException` if the cylinder is degenerate.
    pub fn make_cylinder(
        &mut self,
        base: Point3,
        axis: Vector3,
        radius: f64,
        height: f64,
        segments: u32,
    ) -> Result<SolidId, MouldError> {
        let result = self
            .kernel
            .make_cylinder(base, axis, radius, height, segments);
        self.tracked_result(Stage::Other, result)
    }

    /// # Errors
    ///
    /// `ShellFailure` if the kernel cannot build the wall.
    pub fn shell(
        &mut self,
        solid: SolidId,
        offset: f64,
        open_height: f64,
    ) -> Result<SolidId, MouldError> {
        let result = self.kernel.shell(solid, offset, open_height);
        self.tracked_result(Stage::Shell, result)
    }

    /// # Errors
    ///
    /// `BooleanOperationFailure` if the fuse fails or is empty.
    pub fn union(&mut self, a: SolidId, b: SolidId) -> Result<SolidId, MouldError> {
        let result = self.kernel.union(a, b);
        self.tracked_result(Stage::Boolean, result)
    }

    /// # Errors
    ///
    /// `BooleanOperationFailure` if the cut fails or is empty.
    pub fn subtract(&mut self, target: SolidId, tool: SolidId) -> Result<SolidId, MouldError> {
        let result = self.kernel.subtract(target, tool);
        self.tracked_result(Stage::Boolean, result)
    }

    /// # Errors
    ///
    /// `KernelException` if the handle is stale.
    pub fn volume(&mut self, solid: SolidId) -> Result<Option<f64>, MouldError> {
        self.kernel
            .volume(solid)
            .map_err(|e| normalize(Stage::Other, e))
    }

    /// # Errors
    ///
    /// `KernelException` if the handle is stale.
    pub fn bounding_box(&mut self, solid: SolidId) -> Result<Aabb, MouldError> {
        self.kernel
            .bounding_box(solid)
            .map_err(|e| normalize(Stage::Other, e))
    }

    /// # Errors
    ///
    /// `KernelException` if the solid cannot be tessellated.
    pub fn tessellate(
        &mut self,
        solid: SolidId,
        params: &TessellationParams,
    ) -> Result<TriangleMesh, MouldError> {
        self.kernel
            .tessellate(solid, params)
            .map_err(|e| normalize(Stage::Other, e))
    }

    /// # Errors
    ///
    /// `KernelException` if the STL cannot be produced.
    pub fn export_stl(
        &mut self,
        solid: SolidId,
        params: &TessellationParams,
    ) -> Result<Vec<u8>, MouldError> {
        self.kernel
            .export_stl(solid, params)
            .map_err(|e| normalize(Stage::Other, e))
    }

    /// # Errors
    ///
    /// `KernelException` if the STEP file cannot be produced.
    pub fn export_step(&mut self, solid: SolidId, name: &str) -> Result<String, MouldError> {
        self.kernel
            .export_step(solid, name)
            .map_err(|e| normalize(Stage::Other, e))
    }
}

impl<K: Kernel + ?Sized> Drop for Scope<'_, K> {
    fn drop(&mut self) {
        let count = self.tracked.len();
        while let Some(solid) = self.tracked.pop() {
            if let Err(err) = self.kernel.release(solid) {
                tracing::warn!(?solid, error = %err, "failed to release solid");
            }
        }
        if count > 0 {
            tracing::debug!(released = count, "scope closed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::kernel::testing::{FaultKind, FaultyKernel};
    use crate::kernel::MeshKernel;
    use std::panic::{self, AssertUnwindSafe};

    fn cube(scope: &mut Scope<'_, impl Kernel>, size: f64) -> SolidId {
        scope
            .make_box(Point3::origin(), Point3::new(size, size, size))
            .unwrap()
    }

    #[test]
    fn releases_on_return() {
        let mut kernel = MeshKernel::new();
        let volume = with_scope(&mut kernel, |scope| {
            let a = cube(scope, 2.0);
            let _ = cube(scope, 3.0);
            assert_eq!(scope.tracked(), 2);
            Ok(scope.volume(a)?.unwrap_or_default())
        })
        .unwrap();
        assert!((volume - 8.0).abs() < 1e-9);
        assert_eq!(kernel.live_solids(), 0);
        assert_eq!(kernel.heap_size(), Some(0));
    }

    #[test]
    fn releases_on_error() {
        let mut kernel = FaultyKernel::failing(FaultKind::Shell, 0);
        let result: Result<(), MouldError> = with_scope(&mut kernel, |scope| {
            let a = cube(scope, 2.0);
            scope.shell(a, -1.0, 2.0)?;
            Ok(())
        });
        assert!(matches!(result, Err(MouldError::ShellFailure(_))));
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn releases_on_unwind() {
        let mut kernel = MeshKernel::new();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _: Result<(), MouldError> = with_scope(&mut kernel, |scope| {
                cube(scope, 1.0);
                panic!("engine bug");
            });
        }));
        assert!(outcome.is_err());
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn disposed_solid_is_released_once() {
        let mut kernel = MeshKernel::new();
        with_scope(&mut kernel, |scope| {
            let a = cube(scope, 1.0);
            let b = cube(scope, 2.0);
            scope.dispose(a);
            assert_eq!(scope.tracked(), 1);
            assert_eq!(scope.kernel().live_solids(), 1);
            assert!(scope.volume(b)?.is_some());
            Ok(())
        })
        .unwrap();
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn failed_release_does_not_stop_the_rest() {
        let mut kernel = MeshKernel::new();
        with_scope(&mut kernel, |scope| {
            let a = cube(scope, 1.0);
            cube(scope, 2.0);
            cube(scope, 3.0);
            // Freed behind the scope's back: its release will fail.
            scope.kernel().release(a).unwrap();
            Ok(())
        })
        .unwrap();
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn boolean_errors_are_normalized() {
        let mut kernel = MeshKernel::new();
        let result = with_scope(&mut kernel, |scope| {
            let a = cube(scope, 1.0);
            let b = scope
                .make_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(2.0, 2.0, 2.0))
                .unwrap();
            scope.subtract(a, b)
        });
        assert!(matches!(result, Err(MouldError::BooleanOperationFailure(_))));
    }
}
