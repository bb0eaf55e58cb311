//! Broad phase queries against a physics system.

use std::any::Any;
use std::sync::Arc;

use crate::collector::{Collector, Hit};
use crate::error::{Error, Result};
use crate::handle::NativeHandle;
use crate::native::{raw, GrCollector, GrSystem, RawError};
use crate::types::BodyId;

/// Query interface over a system's broad phase.
///
/// Lives inside its system: holds the system's state alive but never
/// frees it, and goes stale once the system is closed.
pub struct BroadPhaseQuery {
    handle: NativeHandle,
}

impl BroadPhaseQuery {
    pub(crate) fn new(va: u64, container: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            handle: NativeHandle::contained(va, container),
        }
    }

    /// Report every body whose shape contains `point`.
    pub fn collide_point<H, C>(&self, point: [f32; 3], collector: &mut C) -> Result<()>
    where
        H: Hit,
        C: Collector<H>,
    {
        self.run(collector, |sys, shim, sink| {
            raw::broad_phase_collide_point(sys, point, shim, sink)
        })
    }

    /// Report every body whose shape overlaps the probe sphere.
    pub fn collide_sphere<H, C>(
        &self,
        center: [f32; 3],
        radius: f32,
        collector: &mut C,
    ) -> Result<()>
    where
        H: Hit,
        C: Collector<H>,
    {
        self.run(collector, |sys, shim, sink| {
            raw::broad_phase_collide_sphere(sys, center, radius, shim, sink)
        })
    }

    /// Drive one query through the collector's shim. An error from
    /// `add_hit` cannot unwind through the native enumeration, so it is
    /// parked, the shim is forced to stop, and the error is re-raised
    /// once the native call returns.
    fn run<H, C>(
        &self,
        collector: &mut C,
        drive: impl FnOnce(
            GrSystem,
            GrCollector,
            &mut dyn FnMut(u32, f32),
        ) -> std::result::Result<(), RawError>,
    ) -> Result<()>
    where
        H: Hit,
        C: Collector<H>,
    {
        let sys = GrSystem::from_raw(self.handle.va()?);
        let shim = collector.base().shim()?;
        raw::collector_begin(shim)?;

        let mut caught: Option<Error> = None;
        let mut sink = |id: u32, fraction: f32| {
            if caught.is_some() {
                return;
            }
            if let Err(err) = collector.add_hit(H::from_parts(BodyId(id), fraction)) {
                caught = Some(err);
                let _ = raw::collector_force_early_out(shim);
            }
        };
        let drove = drive(sys, shim, &mut sink);
        drop(sink);
        let ended = raw::collector_end(shim);

        if let Some(err) = caught {
            return Err(err);
        }
        drove?;
        ended?;
        Ok(())
    }
}
