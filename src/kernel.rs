//! Kernel facade used by the mould engine.
//!
//! The engine never touches [`SolidStore`] directly: every call goes through
//! the [`Kernel`] trait, so the kernel can be swapped out or wrapped (the
//! tests inject faults this way). [`MeshKernel`] is the in-crate faceted
//! kernel; each of its entry points converts a panic into
//! [`KernelError::Panicked`].

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{KernelError, Result};
use crate::export::{write_step, write_stl};
use crate::math::{Point2, Point3, Vector3};
use crate::operations::boolean::{Subtract, Union};
use crate::operations::creation::{MakeBox, MakeCylinder};
use crate::operations::modification::Shell;
use crate::operations::query::{Aabb, BoundingBox, Volume};
use crate::operations::shaping::Revolve;
use crate::tessellation::{TessellateSolid, TessellationParams, TriangleMesh};
use crate::topology::{SolidId, SolidStore};

/// Operations the mould engine needs from a solid-modelling kernel.
///
/// Solids are handles into kernel-owned storage. Every operation that
/// produces a solid allocates a new one; operands are never consumed. The
/// caller releases each handle exactly once.
pub trait Kernel {
    /// Revolves a closed (radius, height) section 360° about the z axis.
    ///
    /// # Errors
    ///
    /// Returns an error if the section is degenerate or crosses the axis.
    fn revolve(&mut self, section: &[Point2], segments: u32) -> Result<SolidId>;

    /// Creates an axis-aligned box spanning two corners.
    ///
    /// # Errors
    ///
    /// Returns an error if the box has no volume.
    fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId>;

    /// Creates a faceted cylinder from a base centre along `axis`.
    ///
    /// # Errors
    ///
    /// Returns an error for a non-positive radius, zero height or zero axis.
    fn make_cylinder(
        &mut self,
        base: Point3,
        axis: Vector3,
        radius: f64,
        height: f64,
        segments: u32,
    ) -> Result<SolidId>;

    /// Hollows a solid, opening its planar top face at `open_height`.
    /// A negative `offset` grows the wall outward.
    ///
    /// # Errors
    ///
    /// Returns an error if the wall cannot be built.
    fn shell(&mut self, solid: SolidId, offset: f64, open_height: f64) -> Result<SolidId>;

    /// Fuses two solids into a new one.
    ///
    /// # Errors
    ///
    /// Returns an error if either handle is stale or the result is empty.
    fn union(&mut self, a: SolidId, b: SolidId) -> Result<SolidId>;

    /// Cuts `tool` from `target` into a new solid.
    ///
    /// # Errors
    ///
    /// Returns an error if either handle is stale or the result is empty.
    fn subtract(&mut self, target: SolidId, tool: SolidId) -> Result<SolidId>;

    /// Exact enclosed volume, or `None` if this kernel cannot measure it.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale.
    fn volume(&mut self, solid: SolidId) -> Result<Option<f64>>;

    /// Axis-aligned bounds of a solid.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle is stale or the solid is empty.
    fn bounding_box(&mut self, solid: SolidId) -> Result<Aabb>;

    /// Triangulates a solid for rendering.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be tessellated.
    fn tessellate(&mut self, solid: SolidId, params: &TessellationParams) -> Result<TriangleMesh>;

    /// Encodes a solid as binary STL.
    ///
    /// # Errors
    ///
    /// Returns an error if tessellation or encoding fails.
    fn export_stl(&mut self, solid: SolidId, params: &TessellationParams) -> Result<Vec<u8>>;

    /// Encodes a solid as a STEP file named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be written.
    fn export_step(&mut self, solid: SolidId, name: &str) -> Result<String>;

    /// Frees a solid.
    ///
    /// # Errors
    ///
    /// Returns an error if the handle was already released.
    fn release(&mut self, solid: SolidId) -> Result<()>;

    /// Number of live solids.
    fn live_solids(&self) -> usize;

    /// Bytes held by live solids, if the kernel tracks them.
    fn heap_size(&self) -> Option<usize>;
}

/// The faceted kernel backed by a [`SolidStore`].
#[derive(Debug, Default)]
pub struct MeshKernel {
    store: SolidStore,
}

impl MeshKernel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the underlying store.
    #[must_use]
    pub fn store(&self) -> &SolidStore {
        &self.store
    }

    fn guarded<T>(
        &mut self,
        operation: &'static str,
        f: impl FnOnce(&mut SolidStore) -> Result<T>,
    ) -> Result<T> {
        let store = &mut self.store;
        match panic::catch_unwind(AssertUnwindSafe(|| f(store))) {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(operation, %message, "kernel panicked");
                Err(KernelError::Panicked(message))
            }
        }
    }
}

/// Coerces a panic payload to text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

impl Kernel for MeshKernel {
    fn revolve(&mut self, section: &[Point2], segments: u32) -> Result<SolidId> {
        let section = section.to_vec();
        self.guarded("revolve", |store| {
            Revolve::new(section, segments).execute(store)
        })
    }

    fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId> {
        self.guarded("make_box", |store| MakeBox::new(min, max).execute(store))
    }

    fn make_cylinder(
        &mut self,
        base: Point3,
        axis: Vector3,
        radius: f64,
        height: f64,
        segments: u32,
    ) -> Result<SolidId> {
        self.guarded("make_cylinder", |store| {
            MakeCylinder::new(base, radius, axis, height)
                .with_segments(segments)
                .execute(store)
        })
    }

    fn shell(&mut self, solid: SolidId, offset: f64, open_height: f64) -> Result<SolidId> {
        self.guarded("shell", |store| {
            Shell::new(solid, offset, open_height).execute(store)
        })
    }

    fn union(&mut self, a: SolidId, b: SolidId) -> Result<SolidId> {
        self.guarded("union", |store| Union::new(a, b).execute(store))
    }

    fn subtract(&mut self, target: SolidId, tool: SolidId) -> Result<SolidId> {
        self.guarded("subtract", |store| Subtract::new(target, tool).execute(store))
    }

    fn volume(&mut self, solid: SolidId) -> Result<Option<f64>> {
        self.guarded("volume", |store| Volume::new(solid).execute(store).map(Some))
    }

    fn bounding_box(&mut self, solid: SolidId) -> Result<Aabb> {
        self.guarded("bounding_box", |store| {
            BoundingBox::new(solid).execute(store)
        })
    }

    fn tessellate(&mut self, solid: SolidId, params: &TessellationParams) -> Result<TriangleMesh> {
        let params = *params;
        self.guarded("tessellate", |store| {
            TessellateSolid::new(solid, params).execute(store)
        })
    }

    fn export_stl(&mut self, solid: SolidId, params: &TessellationParams) -> Result<Vec<u8>> {
        let params = *params;
        self.guarded("export_stl", |store| {
            let mesh = TessellateSolid::new(solid, params).execute(store)?;
            Ok(write_stl(&mesh)?)
        })
    }

    fn export_step(&mut self, solid: SolidId, name: &str) -> Result<String> {
        self.guarded("export_step", |store| {
            let data = store.solid(solid)?;
            Ok(write_step(data, name)?)
        })
    }

    fn release(&mut self, solid: SolidId) -> Result<()> {
        self.guarded("release", |store| {
            store.remove_solid(solid)?;
            Ok(())
        })
    }

    fn live_solids(&self) -> usize {
        self.store.len()
    }

    fn heap_size(&self) -> Option<usize> {
        Some(self.store.heap_bytes())
    }
}

/// Kernel wrappers for exercising failure paths in tests.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::error::OperationError;

    /// Operations a [`FaultyKernel`] can be told to fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum FaultKind {
        Shell,
        Subtract,
        Union,
        Cylinder,
        Panic,
    }

    /// Wraps a [`MeshKernel`], failing one kind of operation once armed.
    ///
    /// The fault is armed after `skip` successful calls of that kind, so a
    /// test can let early stages through and break a later one. With
    /// `hide_volume`, volume queries report "unavailable".
    #[derive(Debug, Default)]
    pub struct FaultyKernel {
        pub inner: MeshKernel,
        pub fault: Option<(FaultKind, usize)>,
        pub hide_volume: bool,
        calls: usize,
    }

    impl FaultyKernel {
        pub fn failing(kind: FaultKind, skip: usize) -> Self {
            Self {
                fault: Some((kind, skip)),
                ..Self::default()
            }
        }

        pub fn without_volume() -> Self {
            Self {
                hide_volume: true,
                ..Self::default()
            }
        }

        fn trip(&mut self, kind: FaultKind) -> Result<()> {
            match self.fault {
                Some((k, skip)) if k == kind => {
                    self.calls += 1;
                    if self.calls > skip {
                        Err(OperationError::Failed(format!("injected {kind:?} failure")).into())
                    } else {
                        Ok(())
                    }
                }
                _ => Ok(()),
            }
        }
    }

    impl Kernel for FaultyKernel {
        fn revolve(&mut self, section: &[Point2], segments: u32) -> Result<SolidId> {
            if matches!(self.fault, Some((FaultKind::Panic, _))) {
                let section = section.to_vec();
                return self.inner.guarded("revolve", move |_| {
                    panic!("injected panic on {} points", section.len())
                });
            }
            self.inner.revolve(section, segments)
        }

        fn make_box(&mut self, min: Point3, max: Point3) -> Result<SolidId> {
            self.inner.make_box(min, max)
        }

        fn make_cylinder(
            &mut self,
            base: Point3,
            axis: Vector3,
            radius: f64,
            height: f64,
            segments: u32,
        ) -> Result<SolidId> {
            self.trip(FaultKind::Cylinder)?;
            self.inner.make_cylinder(base, axis, radius, height, segments)
        }

        fn shell(&mut self, solid: SolidId, offset: f64, open_height: f64) -> Result<SolidId> {
            self.trip(FaultKind::Shell)?;
            self.inner.shell(solid, offset, open_height)
        }

        fn union(&mut self, a: SolidId, b: SolidId) -> Result<SolidId> {
            self.trip(FaultKind::Union)?;
            self.inner.union(a, b)
        }

        fn subtract(&mut self, target: SolidId, tool: SolidId) -> Result<SolidId> {
            self.trip(FaultKind::Subtract)?;
            self.inner.subtract(target, tool)
        }

        fn volume(&mut self, solid: SolidId) -> Result<Option<f64>> {
            if self.hide_volume {
                return Ok(None);
            }
            self.inner.volume(solid)
        }

        fn bounding_box(&mut self, solid: SolidId) -> Result<Aabb> {
            self.inner.bounding_box(solid)
        }

        fn tessellate(
            &mut self,
            solid: SolidId,
            params: &TessellationParams,
        ) -> Result<TriangleMesh> {
            self.inner.tessellate(solid, params)
        }

        fn export_stl(&mut self, solid: SolidId, params: &TessellationParams) -> Result<Vec<u8>> {
            self.inner.export_stl(solid, params)
        }

        fn export_step(&mut self, solid: SolidId, name: &str) -> Result<String> {
            self.inner.export_step(solid, name)
        }

        fn release(&mut self, solid: SolidId) -> Result<()> {
            self.inner.release(solid)
        }

        fn live_solids(&self) -> usize {
            self.inner.live_solids()
        }

        fn heap_size(&self) -> Option<usize> {
            self.inner.heap_size()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::testing::{FaultKind, FaultyKernel};
    use super::*;
    use approx::assert_relative_eq;

    fn section() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(5.0, 0.0),
            Point2::new(5.0, 10.0),
            Point2::new(0.0, 10.0),
        ]
    }

    #[test]
    fn heap_returns_to_zero_after_release() {
        let mut kernel = MeshKernel::new();
        let a = kernel.revolve(&section(), 16).unwrap();
        let b = kernel
            .make_box(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0))
            .unwrap();
        assert!(kernel.heap_size().unwrap() > 0);
        kernel.release(a).unwrap();
        kernel.release(b).unwrap();
        assert_eq!(kernel.heap_size(), Some(0));
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn double_release_is_an_error() {
        let mut kernel = MeshKernel::new();
        let a = kernel.revolve(&section(), 16).unwrap();
        kernel.release(a).unwrap();
        assert!(kernel.release(a).is_err());
    }

    #[test]
    fn panic_is_caught_with_message() {
        let mut kernel = FaultyKernel::failing(FaultKind::Panic, 0);
        let err = kernel.revolve(&section(), 16).unwrap_err();
        match err {
            KernelError::Panicked(message) => assert!(message.contains("injected panic")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(kernel.live_solids(), 0);
    }

    #[test]
    fn volume_matches_query() {
        let mut kernel = MeshKernel::new();
        let a = kernel
            .make_box(Point3::origin(), Point3::new(2.0, 3.0, 4.0))
            .unwrap();
        assert_relative_eq!(kernel.volume(a).unwrap().unwrap(), 24.0, epsilon = 1e-9);
    }

    #[test]
    fn exports_are_produced() {
        let mut kernel = MeshKernel::new();
        let a = kernel.revolve(&section(), 16).unwrap();
        let stl = kernel.export_stl(a, &TessellationParams::preview()).unwrap();
        assert!(stl.len() > 84);
        let step = kernel.export_step(a, "proof").unwrap();
        assert!(step.contains("FACETED_BREP"));
    }
}
