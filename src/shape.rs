//! Collision shapes and their construction recipes.
//!
//! Shape construction is fallible in the engine's value-level sense:
//! `create` always hands back a [`ShapeResult`], and bad dimensions show
//! up as an error stored in the result rather than an `Err`.

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::native::{raw, GrShape, GrShapeSettings};
use crate::refcount::{self, Ref, RefConst, RefTarget};
use crate::result::{self, CreationOutput, CreationResult};

/// Result of building a shape from settings.
pub type ShapeResult = CreationResult<Shape>;

/// Kind of a finished shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Sphere,
    Box,
}

fn co_owned_counted(va: u64) -> NativeHandle {
    NativeHandle::co_owned(va, |va| Ok(raw::object_release(va)?))
}

/// A finished, immutable collision shape.
///
/// Intrusively reference counted on the engine side; this wrapper holds
/// one count and gives it back on close.
#[derive(Debug)]
pub struct Shape {
    handle: NativeHandle,
}

impl Shape {
    fn gr(&self) -> Result<GrShape> {
        Ok(GrShape::from_raw(self.handle.va()?))
    }

    pub fn kind(&self) -> Result<ShapeKind> {
        Ok(match raw::shape_kind(self.gr()?)? {
            raw::GR_SHAPE_BOX => ShapeKind::Box,
            _ => ShapeKind::Sphere,
        })
    }

    /// Current reference count, for diagnostics.
    pub fn ref_count(&self) -> Result<u32> {
        Ok(raw::object_ref_count(self.handle.va()?)?)
    }

    /// Take an additional co-owning reference to this shape.
    pub fn to_ref(&self) -> Result<Ref<Shape>> {
        Ref::new(self)
    }

    /// Take an additional read-only reference to this shape.
    pub fn to_ref_const(&self) -> Result<RefConst<Shape>> {
        RefConst::new(self)
    }

    /// Give this wrapper's count back early instead of waiting for drop.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}

impl refcount::sealed::Sealed for Shape {}

impl RefTarget for Shape {
    fn target_va(&self) -> Result<u64> {
        self.handle.va()
    }

    fn from_borrowed_va(va: u64) -> Self {
        Self {
            handle: NativeHandle::borrowed(va),
        }
    }
}

impl result::sealed::Sealed for Shape {}

impl CreationOutput for Shape {
    fn from_owned_va(va: u64) -> Self {
        Self {
            handle: co_owned_counted(va),
        }
    }
}

macro_rules! impl_shape_settings {
    ($ty:ident) => {
        impl $ty {
            /// Build the shape this recipe describes. Dimension checks
            /// happen here; failures come back inside the result.
            pub fn create(&self) -> Result<ShapeResult> {
                let res =
                    raw::shape_settings_create(GrShapeSettings::from_raw(self.handle.va()?))?;
                Ok(ShapeResult::from_va(res.raw()))
            }

            /// Take an additional co-owning reference to this recipe.
            pub fn to_ref(&self) -> Result<Ref<$ty>> {
                Ref::new(self)
            }

            /// Give this wrapper's count back early instead of waiting
            /// for drop.
            pub fn close(&mut self) -> Result<()> {
                self.handle.close()
            }
        }

        impl refcount::sealed::Sealed for $ty {}

        impl RefTarget for $ty {
            fn target_va(&self) -> Result<u64> {
                self.handle.va()
            }

            fn from_borrowed_va(va: u64) -> Self {
                Self {
                    handle: NativeHandle::borrowed(va),
                }
            }
        }
    };
}

/// Recipe for a sphere shape.
pub struct SphereShapeSettings {
    handle: NativeHandle,
}

impl SphereShapeSettings {
    /// New recipe. The radius is not validated here; `create` reports
    /// bad dimensions through its result.
    pub fn new(radius: f32) -> Result<Self> {
        let h = raw::shape_settings_new_sphere(radius);
        Ok(Self {
            handle: co_owned_counted(h.raw()),
        })
    }
}

impl_shape_settings!(SphereShapeSettings);

/// Recipe for an axis-aligned box shape.
pub struct BoxShapeSettings {
    handle: NativeHandle,
}

impl BoxShapeSettings {
    /// New recipe. Half extents are not validated here; `create`
    /// reports bad dimensions through its result.
    pub fn new(half_extents: [f32; 3]) -> Result<Self> {
        let h = raw::shape_settings_new_box(half_extents);
        Ok(Self {
            handle: co_owned_counted(h.raw()),
        })
    }
}

impl_shape_settings!(BoxShapeSettings);
