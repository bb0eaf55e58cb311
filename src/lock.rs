//! Engine-side locking: mutexes and per-body read/write locks.

use std::any::Any;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::handle::NativeHandle;
use crate::native::{raw, GrBodyLock, GrMutex, GrSystem};
use crate::types::BodyId;

/// Engine-side mutex with explicit lock and unlock.
///
/// There are no timeouts; `try_lock` in a loop is the escape hatch when
/// blocking is not an option.
pub struct Mutex {
    handle: NativeHandle,
}

impl Mutex {
    pub fn new() -> Result<Self> {
        let m = raw::mutex_new();
        Ok(Self {
            handle: NativeHandle::owned(m.raw(), |va| Ok(raw::mutex_free(GrMutex::from_raw(va))?)),
        })
    }

    fn gr(&self) -> Result<GrMutex> {
        Ok(GrMutex::from_raw(self.handle.va()?))
    }

    /// Block until the mutex is acquired.
    pub fn lock(&self) -> Result<()> {
        Ok(raw::mutex_lock(self.gr()?)?)
    }

    /// Acquire without blocking; `false` means it was already held.
    pub fn try_lock(&self) -> Result<bool> {
        Ok(raw::mutex_try_lock(self.gr()?)?)
    }

    /// Release the mutex. Unlocking one that is not held reports
    /// `LockMisuse` and leaves the native record untouched.
    pub fn unlock(&self) -> Result<()> {
        Ok(raw::mutex_unlock(self.gr()?)?)
    }

    /// Free the native mutex.
    ///
    /// This is called automatically on drop, but can be called explicitly
    /// to handle any errors that may occur during release.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}

/// Whether a body lock was taken for reading or writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

fn lock_release_handle(h: GrBodyLock) -> NativeHandle {
    NativeHandle::owned(h.raw(), |va| {
        Ok(raw::body_lock_release(GrBodyLock::from_raw(va))?)
    })
}

/// A held read or write lock on one body.
///
/// Dropping the lock releases it in the mode it was actually taken in,
/// so even a lock consumed by a mismatched unlock call never leaks.
pub struct BodyLock {
    handle: NativeHandle,
    mode: LockMode,
    body: BodyId,
}

impl BodyLock {
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    fn gr(&self) -> Result<GrBodyLock> {
        Ok(GrBodyLock::from_raw(self.handle.va()?))
    }

    /// Read the locked body's position. Valid in either mode.
    pub fn position(&self) -> Result<[f32; 3]> {
        Ok(raw::body_lock_position(self.gr()?)?)
    }

    /// Move the locked body. Fails `LockMisuse` on a read lock.
    pub fn set_position(&self, position: [f32; 3]) -> Result<()> {
        Ok(raw::body_lock_set_position(self.gr()?, position)?)
    }
}

/// Locks over a batch of bodies. Slots for bodies that no longer exist
/// are empty; the rest of the batch still holds.
pub struct BodyLockMulti {
    locks: Vec<Option<BodyLock>>,
}

impl BodyLockMulti {
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }

    /// The lock in slot `i`, if that body was found.
    pub fn lock(&self, i: usize) -> Option<&BodyLock> {
        self.locks.get(i).and_then(Option::as_ref)
    }

    /// The body locked in slot `i`, if that body was found.
    pub fn get_body(&self, i: usize) -> Option<BodyId> {
        self.lock(i).map(BodyLock::body)
    }

    /// Release every held slot. Reports the first failure but keeps
    /// releasing the rest.
    pub fn release_locks(&mut self) -> Result<()> {
        let mut first_err = None;
        for slot in self.locks.iter_mut() {
            if let Some(mut lock) = slot.take() {
                if let Err(err) = lock.handle.close() {
                    first_err.get_or_insert(err);
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Acquires and releases body locks for one system.
///
/// Lives inside its system: holds the system's state alive but never
/// frees it, and goes stale once the system is closed.
pub struct BodyLockInterface {
    handle: NativeHandle,
}

impl BodyLockInterface {
    pub(crate) fn new(va: u64, container: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            handle: NativeHandle::contained(va, container),
        }
    }

    fn sys(&self) -> Result<GrSystem> {
        Ok(GrSystem::from_raw(self.handle.va()?))
    }

    /// Take a shared lock on `body`. Blocks while a write lock is held.
    pub fn lock_read(&self, body: BodyId) -> Result<BodyLock> {
        let h = raw::body_lock_acquire(self.sys()?, body.0, false)?;
        Ok(BodyLock {
            handle: lock_release_handle(h),
            mode: LockMode::Read,
            body,
        })
    }

    /// Take an exclusive lock on `body`. Blocks while any lock is held.
    pub fn lock_write(&self, body: BodyId) -> Result<BodyLock> {
        let h = raw::body_lock_acquire(self.sys()?, body.0, true)?;
        Ok(BodyLock {
            handle: lock_release_handle(h),
            mode: LockMode::Write,
            body,
        })
    }

    /// Release a read lock. Passing a write lock is reported as
    /// `LockMisuse`; the lock is still released, in its true mode.
    pub fn unlock_read(&self, lock: BodyLock) -> Result<()> {
        if lock.mode != LockMode::Read {
            return Err(Error::LockMisuse("unlock_read on a write lock".into()));
        }
        let mut lock = lock;
        lock.handle.close()
    }

    /// Release a write lock. Passing a read lock is reported as
    /// `LockMisuse`; the lock is still released, in its true mode.
    pub fn unlock_write(&self, lock: BodyLock) -> Result<()> {
        if lock.mode != LockMode::Write {
            return Err(Error::LockMisuse("unlock_write on a read lock".into()));
        }
        let mut lock = lock;
        lock.handle.close()
    }

    /// Take shared locks on a batch of bodies in one atomic step.
    pub fn lock_read_multi(&self, bodies: &[BodyId]) -> Result<BodyLockMulti> {
        self.lock_multi(bodies, false, LockMode::Read)
    }

    /// Take exclusive locks on a batch of bodies in one atomic step.
    pub fn lock_write_multi(&self, bodies: &[BodyId]) -> Result<BodyLockMulti> {
        self.lock_multi(bodies, true, LockMode::Write)
    }

    fn lock_multi(&self, bodies: &[BodyId], exclusive: bool, mode: LockMode) -> Result<BodyLockMulti> {
        let ids: Vec<u32> = bodies.iter().map(|b| b.0).collect();
        let handles = raw::body_lock_acquire_multi(self.sys()?, &ids, exclusive)?;
        let locks = handles
            .into_iter()
            .zip(bodies)
            .map(|(h, body)| {
                h.map(|h| BodyLock {
                    handle: lock_release_handle(h),
                    mode,
                    body: *body,
                })
            })
            .collect();
        Ok(BodyLockMulti { locks })
    }
}
