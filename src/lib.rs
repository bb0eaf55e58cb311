//! Safe Rust interface to the Granite physics engine's handle-based core.
//!
//! Every engine-side object is reached through an opaque, non-zero virtual
//! address. This crate wraps those addresses in typed owners with
//! deterministic `close()` semantics and drop as a best-effort finalizer,
//! intrusive reference-counted co-ownership, fallible construction results,
//! collector callbacks with early-out, and scoped body locking.
//!
//! Virtual addresses are meaningful only inside one process and must never
//! be persisted or shared across processes.
//!
//! # Example
//!
//! ```no_run
//! use granite::{
//!     AllHitCollector, BodyCreationSettings, MotionType, PhysicsSystem,
//!     PhysicsSystemSettings, SphereShapeSettings,
//! };
//!
//! fn main() -> granite::Result<()> {
//!     let system = PhysicsSystem::new(&PhysicsSystemSettings::default())?;
//!
//!     let settings = SphereShapeSettings::new(0.5)?;
//!     let mut result = settings.create()?;
//!     assert!(!result.has_error());
//!     let shape = result.get()?;
//!
//!     let mut body_settings = BodyCreationSettings::new(&shape)?;
//!     body_settings.position = [0.0, 2.0, 0.0];
//!     body_settings.motion_type = MotionType::Dynamic;
//!     let body = system.body_interface().create_and_add_body(&body_settings)?;
//!
//!     let mut collector = AllHitCollector::new()?;
//!     system
//!         .broad_phase_query()
//!         .collide_point([0.0, 2.0, 0.0], &mut collector)?;
//!     assert_eq!(collector.hits()[0].body, body);
//!     Ok(())
//! }
//! ```

pub mod alloc;
pub mod collector;
pub mod error;
pub mod handle;
pub mod lock;
mod native;
pub mod query;
pub mod refcount;
pub mod result;
pub mod shape;
pub mod stream;
pub mod system;
pub mod types;

// Re-export main types at the crate root
pub use alloc::TempAllocatorMalloc;
pub use collector::{
    AllHitCollector, AnyHitCollector, BroadPhaseHit, ClosestHitCollector, Collector,
    CollectorBase, Hit,
};
pub use error::{Error, Result};
pub use handle::{NativeHandle, Ownership};
pub use lock::{BodyLock, BodyLockInterface, BodyLockMulti, LockMode, Mutex};
pub use query::BroadPhaseQuery;
pub use refcount::{Borrowed, Ref, RefConst, RefTarget};
pub use result::{CreationOutput, CreationResult};
pub use shape::{BoxShapeSettings, Shape, ShapeKind, ShapeResult, SphereShapeSettings};
pub use stream::{StateRecorder, StreamOut};
pub use system::{Body, BodyInterface, PhysicsSystem};
pub use types::{BodyCreationSettings, BodyId, MotionType, PhysicsSystemSettings};

/// Engine version constants.
pub mod version {
    /// Engine major version.
    pub const MAJOR: i32 = 0;
    /// Engine minor version.
    pub const MINOR: i32 = 1;
    /// Engine patch version.
    pub const PATCH: i32 = 0;
}

/// Get the engine version string (e.g., "0.1.0").
pub fn engine_version() -> String {
    format!("{}.{}.{}", version::MAJOR, version::MINOR, version::PATCH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        assert_eq!(engine_version(), "0.1.0");
    }
}
