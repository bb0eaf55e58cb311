//! Intrusive reference-counted co-ownership.
//!
//! A [`Ref`] holds an engine-side reference cell carrying exactly one
//! count on its target. The target stays alive as long as any cell
//! does; closing the last cell frees it.

use std::marker::PhantomData;
use std::ops::Deref;

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::native::{raw, GrRefCell};

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Objects with an engine-side intrusive reference count.
pub trait RefTarget: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn target_va(&self) -> Result<u64>;
    #[doc(hidden)]
    fn from_borrowed_va(va: u64) -> Self;
}

fn new_cell(target_va: u64) -> Result<NativeHandle> {
    let cell = raw::ref_new(target_va)?;
    Ok(NativeHandle::co_owned(cell.raw(), |va| {
        Ok(raw::ref_free(GrRefCell::from_raw(va))?)
    }))
}

/// Mutable co-owning reference to a counted object.
pub struct Ref<T: RefTarget> {
    handle: NativeHandle,
    _marker: PhantomData<T>,
}

impl<T: RefTarget> Ref<T> {
    /// Take a new count on `target`.
    pub fn new(target: &T) -> Result<Self> {
        Ok(Self {
            handle: new_cell(target.target_va()?)?,
            _marker: PhantomData,
        })
    }

    /// Borrow the target. The borrow cannot outlive this reference, so
    /// the target is live for as long as the view is usable.
    pub fn get_ptr(&self) -> Result<Borrowed<'_, T>> {
        let target = raw::ref_target(GrRefCell::from_raw(self.handle.va()?))?;
        Ok(Borrowed {
            inner: T::from_borrowed_va(target),
            _life: PhantomData,
        })
    }

    /// An additional co-owning reference to the same target.
    pub fn clone_ref(&self) -> Result<Ref<T>> {
        let target = raw::ref_target(GrRefCell::from_raw(self.handle.va()?))?;
        Ok(Ref {
            handle: new_cell(target)?,
            _marker: PhantomData,
        })
    }

    /// A read-only co-owning reference to the same target.
    pub fn to_const(&self) -> Result<RefConst<T>> {
        let target = raw::ref_target(GrRefCell::from_raw(self.handle.va()?))?;
        Ok(RefConst {
            handle: new_cell(target)?,
            _marker: PhantomData,
        })
    }

    /// Give the count back early instead of waiting for drop.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }

    pub(crate) fn target_va(&self) -> Result<u64> {
        raw::ref_target(GrRefCell::from_raw(self.handle.va()?)).map_err(Into::into)
    }
}

/// Read-only co-owning reference to a counted object.
pub struct RefConst<T: RefTarget> {
    handle: NativeHandle,
    _marker: PhantomData<T>,
}

impl<T: RefTarget> RefConst<T> {
    /// Take a new count on `target`.
    pub fn new(target: &T) -> Result<Self> {
        Ok(Self {
            handle: new_cell(target.target_va()?)?,
            _marker: PhantomData,
        })
    }

    /// Borrow the target for as long as this reference lives.
    pub fn get_ptr(&self) -> Result<Borrowed<'_, T>> {
        let target = raw::ref_target(GrRefCell::from_raw(self.handle.va()?))?;
        Ok(Borrowed {
            inner: T::from_borrowed_va(target),
            _life: PhantomData,
        })
    }

    /// An additional read-only reference to the same target.
    pub fn clone_ref(&self) -> Result<RefConst<T>> {
        let target = raw::ref_target(GrRefCell::from_raw(self.handle.va()?))?;
        Ok(RefConst {
            handle: new_cell(target)?,
            _marker: PhantomData,
        })
    }

    /// Give the count back early instead of waiting for drop.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}

/// A borrow of a counted object, scoped to the reference it came from.
pub struct Borrowed<'a, T> {
    inner: T,
    _life: PhantomData<&'a ()>,
}

impl<T> Deref for Borrowed<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}
