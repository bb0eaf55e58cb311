//! Ownership core shared by every wrapper in the crate.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};

/// How a wrapper relates to the engine object behind its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Sole owner: closing destroys the object.
    Owned,
    /// Holds exactly one reference count: closing decrements, and the
    /// object dies when the last co-owner lets go.
    CoOwned,
    /// Views an object owned elsewhere: closing only forgets the address.
    Borrowed,
}

type ReleaseFn = Box<dyn FnOnce(u64) -> Result<()> + Send + Sync>;

/// Typed owner of one native virtual address.
///
/// The address slot is one-shot: `close`, `detach`, and drop all go
/// through an atomic swap, so the release action runs at most once no
/// matter how the wrapper goes away.
pub struct NativeHandle {
    va: AtomicU64,
    ownership: Ownership,
    release: Option<ReleaseFn>,
    /// Keeps the owning wrapper's state alive for dependent objects.
    container: Option<Arc<dyn Any + Send + Sync>>,
}

impl NativeHandle {
    /// Sole ownership of `va`; `release` destroys the object.
    pub fn owned<F>(va: u64, release: F) -> Self
    where
        F: FnOnce(u64) -> Result<()> + Send + Sync + 'static,
    {
        debug_assert!(va != 0);
        Self {
            va: AtomicU64::new(va),
            ownership: Ownership::Owned,
            release: Some(Box::new(release)),
            container: None,
        }
    }

    /// Co-ownership of `va` through one reference count; `release`
    /// gives that count back.
    pub fn co_owned<F>(va: u64, release: F) -> Self
    where
        F: FnOnce(u64) -> Result<()> + Send + Sync + 'static,
    {
        debug_assert!(va != 0);
        Self {
            va: AtomicU64::new(va),
            ownership: Ownership::CoOwned,
            release: Some(Box::new(release)),
            container: None,
        }
    }

    /// Non-owning view of `va`.
    pub fn borrowed(va: u64) -> Self {
        Self {
            va: AtomicU64::new(va),
            ownership: Ownership::Borrowed,
            release: None,
            container: None,
        }
    }

    /// Non-owning view that also keeps `container` alive, for objects
    /// whose lifetime is contained in their owner's.
    pub fn contained(va: u64, container: Arc<dyn Any + Send + Sync>) -> Self {
        debug_assert!(va != 0);
        Self {
            va: AtomicU64::new(va),
            ownership: Ownership::Borrowed,
            release: None,
            container: Some(container),
        }
    }

    /// A handle with no address yet; `attach` assigns one later.
    pub fn unassigned(ownership: Ownership) -> Self {
        Self {
            va: AtomicU64::new(0),
            ownership,
            release: None,
            container: None,
        }
    }

    /// Assign an address to an unassigned handle.
    pub fn attach<F>(&mut self, va: u64, release: F) -> Result<()>
    where
        F: FnOnce(u64) -> Result<()> + Send + Sync + 'static,
    {
        if va == 0 {
            return Err(Error::InvalidHandle);
        }
        if self
            .va
            .compare_exchange(0, va, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::AlreadyAssigned);
        }
        self.release = Some(Box::new(release));
        Ok(())
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    /// The containing object this handle keeps alive, if any.
    pub fn container(&self) -> Option<&Arc<dyn Any + Send + Sync>> {
        self.container.as_ref()
    }

    pub fn is_assigned(&self) -> bool {
        self.va.load(Ordering::Acquire) != 0
    }

    /// The current address, or `UnassignedHandle` after close or detach.
    pub fn va(&self) -> Result<u64> {
        match self.va.load(Ordering::Acquire) {
            0 => Err(Error::UnassignedHandle),
            va => Ok(va),
        }
    }

    /// Run the release action and forget the address.
    ///
    /// This is called automatically on drop, but can be called explicitly
    /// to handle any errors that may occur during release. Closing an
    /// already-closed handle is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let va = self.va.swap(0, Ordering::AcqRel);
        if va == 0 {
            return Ok(());
        }
        match self.release.take() {
            Some(release) => release(va),
            None => Ok(()),
        }
    }

    /// Take the address out without running the release action. The
    /// caller now carries whatever obligation the handle held.
    pub fn detach(&mut self) -> Result<u64> {
        let va = self.va.swap(0, Ordering::AcqRel);
        if va == 0 {
            return Err(Error::UnassignedHandle);
        }
        self.release = None;
        Ok(va)
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        let va = self.va.load(Ordering::Relaxed);
        if va == 0 {
            return;
        }
        if let Err(err) = self.close() {
            tracing::warn!(va, error = %err, "release failed during drop");
        }
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("va", &self.va.load(Ordering::Relaxed))
            .field("ownership", &self.ownership)
            .finish()
    }
}
