//! Scratch allocators for simulation stepping.

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::native::{raw, GrTempAlloc};

/// Malloc-backed temporary allocator handed to [`crate::PhysicsSystem::update`].
pub struct TempAllocatorMalloc {
    handle: NativeHandle,
}

impl TempAllocatorMalloc {
    pub fn new() -> Result<Self> {
        let h = raw::temp_alloc_new();
        Ok(Self {
            handle: NativeHandle::owned(h.raw(), |va| {
                Ok(raw::temp_alloc_free(GrTempAlloc::from_raw(va))?)
            }),
        })
    }

    pub(crate) fn gr(&self) -> Result<GrTempAlloc> {
        Ok(GrTempAlloc::from_raw(self.handle.va()?))
    }

    /// Free the native allocator.
    ///
    /// This is called automatically on drop, but can be called explicitly
    /// to handle any errors that may occur during release.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}
