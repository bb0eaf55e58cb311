//! The physics system and its body interfaces.

use std::any::Any;
use std::sync::Arc;

use crate::alloc::TempAllocatorMalloc;
use crate::error::Result;
use crate::handle::NativeHandle;
use crate::lock::BodyLockInterface;
use crate::native::{raw, GrShape, GrSystem};
use crate::query::BroadPhaseQuery;
use crate::stream::StateRecorder;
use crate::types::{BodyCreationSettings, BodyId, PhysicsSystemSettings};

/// Shared owner state: the one handle that frees the native system.
/// Dependent interfaces keep this alive through their containment link.
pub(crate) struct SystemCore {
    handle: parking_lot::Mutex<NativeHandle>,
}

/// An owning physics world.
///
/// # Example
///
/// ```no_run
/// use granite::{PhysicsSystem, PhysicsSystemSettings};
///
/// # fn example() -> granite::Result<()> {
/// let system = PhysicsSystem::new(&PhysicsSystemSettings::default())?;
/// let bodies = system.body_interface();
/// # Ok(())
/// # }
/// ```
pub struct PhysicsSystem {
    core: Arc<SystemCore>,
    va: u64,
}

impl PhysicsSystem {
    pub fn new(settings: &PhysicsSystemSettings) -> Result<Self> {
        let h = raw::system_new(settings.max_bodies);
        let handle =
            NativeHandle::owned(h.raw(), |va| Ok(raw::system_free(GrSystem::from_raw(va))?));
        Ok(Self {
            core: Arc::new(SystemCore {
                handle: parking_lot::Mutex::new(handle),
            }),
            va: h.raw(),
        })
    }

    fn container(&self) -> Arc<dyn Any + Send + Sync> {
        Arc::clone(&self.core) as Arc<dyn Any + Send + Sync>
    }

    fn gr(&self) -> Result<GrSystem> {
        Ok(GrSystem::from_raw(self.core.handle.lock().va()?))
    }

    /// Interface for creating, destroying, and inspecting bodies.
    pub fn body_interface(&self) -> BodyInterface {
        BodyInterface::new(self.va, self.container())
    }

    /// Interface for taking read and write locks on bodies.
    pub fn body_lock_interface(&self) -> BodyLockInterface {
        BodyLockInterface::new(self.va, self.container())
    }

    /// Query interface over the broad phase.
    pub fn broad_phase_query(&self) -> BroadPhaseQuery {
        BroadPhaseQuery::new(self.va, self.container())
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Takes each dynamic body's write lock internally, so calling this
    /// while holding a lock on a dynamic body blocks.
    pub fn update(&self, dt: f32, temp: &TempAllocatorMalloc) -> Result<()> {
        Ok(raw::system_step(self.gr()?, dt, temp.gr()?)?)
    }

    /// Append a snapshot of all bodies to `recorder`.
    pub fn save_state(&self, recorder: &mut StateRecorder) -> Result<()> {
        Ok(raw::system_save_state(self.gr()?, recorder.gr()?)?)
    }

    /// Free the native system. Destroys all remaining bodies.
    ///
    /// This is called automatically when the system and every interface
    /// derived from it are gone, but can be called explicitly to handle
    /// any errors that may occur during release. Interfaces outliving an
    /// explicit close fail with `InvalidHandle` from then on.
    pub fn close(&mut self) -> Result<()> {
        self.core.handle.lock().close()
    }
}

/// Creates, destroys, and inspects bodies.
///
/// Lives inside its system: holds the system's state alive but never
/// frees it.
pub struct BodyInterface {
    handle: NativeHandle,
}

impl BodyInterface {
    pub(crate) fn new(va: u64, container: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            handle: NativeHandle::contained(va, container),
        }
    }

    fn sys(&self) -> Result<GrSystem> {
        Ok(GrSystem::from_raw(self.handle.va()?))
    }

    /// Create a body and add it to the simulation. The body takes its
    /// own reference on the shape.
    pub fn create_and_add_body(&self, settings: &BodyCreationSettings) -> Result<BodyId> {
        let shape_va = settings.shape.target_va()?;
        let id = raw::body_create(
            self.sys()?,
            GrShape::from_raw(shape_va),
            settings.position,
            settings.motion_type.into(),
        )?;
        Ok(BodyId(id))
    }

    /// Remove a body from the simulation and destroy it.
    pub fn remove_and_destroy_body(&self, body: BodyId) -> Result<()> {
        Ok(raw::body_destroy(self.sys()?, body.0)?)
    }

    pub fn is_added(&self, body: BodyId) -> Result<bool> {
        Ok(raw::body_is_added(self.sys()?, body.0)?)
    }

    pub fn position(&self, body: BodyId) -> Result<[f32; 3]> {
        Ok(raw::body_position(self.sys()?, body.0)?)
    }

    pub fn set_position(&self, body: BodyId, position: [f32; 3]) -> Result<()> {
        Ok(raw::body_set_position(self.sys()?, body.0, position)?)
    }

    /// Borrow a view of one body.
    pub fn body(&self, id: BodyId) -> Body<'_> {
        Body { iface: self, id }
    }
}

/// Read-only view of one body, scoped to its interface.
pub struct Body<'a> {
    iface: &'a BodyInterface,
    id: BodyId,
}

impl Body<'_> {
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn position(&self) -> Result<[f32; 3]> {
        self.iface.position(self.id)
    }

    pub fn is_added(&self) -> Result<bool> {
        self.iface.is_added(self.id)
    }
}
