//! Collector callbacks for query results.
//!
//! Queries report hits through a [`Collector`]. The collector owns a
//! native shim whose state machine the query loop consults after every
//! hit, which is how early-out requests cross from Rust back into the
//! engine's enumeration.

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::native::{raw, GrCollector};
use crate::types::BodyId;

/// A single query hit.
pub trait Hit: Copy {
    #[doc(hidden)]
    fn from_parts(body: BodyId, fraction: f32) -> Self;

    /// Sort key: smaller is closer.
    fn fraction(&self) -> f32;
}

/// Hit record from a broad phase query. The fraction is the squared
/// distance from the probe to the body's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BroadPhaseHit {
    pub body: BodyId,
    pub fraction: f32,
}

impl Hit for BroadPhaseHit {
    fn from_parts(body: BodyId, fraction: f32) -> Self {
        Self { body, fraction }
    }

    fn fraction(&self) -> f32 {
        self.fraction
    }
}

/// Owns the native shim every collector drives its query through.
pub struct CollectorBase {
    handle: NativeHandle,
}

impl CollectorBase {
    pub fn new() -> Result<Self> {
        let shim = raw::collector_new();
        Ok(Self {
            handle: NativeHandle::owned(shim.raw(), |va| {
                Ok(raw::collector_free(GrCollector::from_raw(va))?)
            }),
        })
    }

    pub(crate) fn shim(&self) -> Result<GrCollector> {
        Ok(GrCollector::from_raw(self.handle.va()?))
    }

    /// Ask the running query to stop at the next opportunity.
    pub fn force_early_out(&self) -> Result<()> {
        Ok(raw::collector_force_early_out(self.shim()?)?)
    }

    /// Whether the last query ended early. Sticky until the shim is
    /// rearmed by the next query or an explicit reset.
    pub fn had_early_out(&self) -> Result<bool> {
        Ok(raw::collector_status(self.shim()?)? == raw::GR_COLLECT_EARLY_OUT)
    }

    /// Return the shim to idle and clear a sticky early-out.
    pub fn reset(&self) -> Result<()> {
        Ok(raw::collector_reset(self.shim()?)?)
    }
}

/// Receives hits from a query.
pub trait Collector<H: Hit> {
    fn base(&self) -> &CollectorBase;

    /// Record one hit. Returning an error aborts the query and the
    /// error resurfaces from the query call itself.
    fn add_hit(&mut self, hit: H) -> Result<()>;

    /// Discard accumulated hits and rearm for another query.
    fn reset(&mut self) -> Result<()>;
}

/// Keeps every hit, in encounter order.
pub struct AllHitCollector {
    base: CollectorBase,
    hits: Vec<BroadPhaseHit>,
}

impl AllHitCollector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base: CollectorBase::new()?,
            hits: Vec::new(),
        })
    }

    pub fn hits(&self) -> &[BroadPhaseHit] {
        &self.hits
    }
}

impl Collector<BroadPhaseHit> for AllHitCollector {
    fn base(&self) -> &CollectorBase {
        &self.base
    }

    fn add_hit(&mut self, hit: BroadPhaseHit) -> Result<()> {
        self.hits.push(hit);
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.hits.clear();
        self.base.reset()
    }
}

/// Keeps only the hit with the smallest fraction.
pub struct ClosestHitCollector {
    base: CollectorBase,
    closest: Option<BroadPhaseHit>,
}

impl ClosestHitCollector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base: CollectorBase::new()?,
            closest: None,
        })
    }

    pub fn closest(&self) -> Option<BroadPhaseHit> {
        self.closest
    }
}

impl Collector<BroadPhaseHit> for ClosestHitCollector {
    fn base(&self) -> &CollectorBase {
        &self.base
    }

    fn add_hit(&mut self, hit: BroadPhaseHit) -> Result<()> {
        let closer = match self.closest {
            Some(best) => hit.fraction() < best.fraction(),
            None => true,
        };
        if closer {
            self.closest = Some(hit);
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.closest = None;
        self.base.reset()
    }
}

/// Stops the query at the first hit.
pub struct AnyHitCollector {
    base: CollectorBase,
    hit: Option<BroadPhaseHit>,
}

impl AnyHitCollector {
    pub fn new() -> Result<Self> {
        Ok(Self {
            base: CollectorBase::new()?,
            hit: None,
        })
    }

    pub fn hit(&self) -> Option<BroadPhaseHit> {
        self.hit
    }
}

impl Collector<BroadPhaseHit> for AnyHitCollector {
    fn base(&self) -> &CollectorBase {
        &self.base
    }

    fn add_hit(&mut self, hit: BroadPhaseHit) -> Result<()> {
        if self.hit.is_none() {
            self.hit = Some(hit);
            self.base.force_early_out()?;
        }
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.hit = None;
        self.base.reset()
    }
}
