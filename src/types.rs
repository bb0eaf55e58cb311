//! Type definitions and enums.

use crate::error::Result;
use crate::native::raw;
use crate::refcount::Ref;
use crate::shape::Shape;

/// Identifier of a body within one physics system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub u32);

/// How a body participates in simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionType {
    /// Never moves.
    #[default]
    Static,
    /// Moved by the application, not by forces.
    Kinematic,
    /// Fully simulated.
    Dynamic,
}

impl From<MotionType> for i32 {
    fn from(motion: MotionType) -> i32 {
        match motion {
            MotionType::Static => raw::GR_MOTION_STATIC,
            MotionType::Kinematic => raw::GR_MOTION_KINEMATIC,
            MotionType::Dynamic => raw::GR_MOTION_DYNAMIC,
        }
    }
}

/// Options for creating a physics system.
#[derive(Debug, Clone, Copy)]
pub struct PhysicsSystemSettings {
    /// Hard cap on simultaneously existing bodies.
    pub max_bodies: u32,
}

impl Default for PhysicsSystemSettings {
    fn default() -> Self {
        Self { max_bodies: 1024 }
    }
}

/// Options for creating a body.
///
/// Holds a co-owning reference on the shape, so the shape outlives the
/// settings even if the caller drops its own wrapper.
pub struct BodyCreationSettings {
    pub shape: Ref<Shape>,
    pub position: [f32; 3],
    pub motion_type: MotionType,
}

impl BodyCreationSettings {
    /// Settings for a static body at the origin using `shape`.
    pub fn new(shape: &Shape) -> Result<Self> {
        Ok(Self {
            shape: shape.to_ref()?,
            position: [0.0; 3],
            motion_type: MotionType::Static,
        })
    }
}
