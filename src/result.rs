//! Fallible native constructions as first-class values.
//!
//! Some engine factories never fail outright; they hand back a result
//! object that stores either the constructed object or an error message.
//! [`CreationResult`] wraps that object and transfers the stored value
//! out exactly once.

use std::marker::PhantomData;

use crate::error::Result;
use crate::handle::NativeHandle;
use crate::native::{raw, GrResult};

pub(crate) mod sealed {
    pub trait Sealed {}
}

/// Objects that can come out of a creation result.
pub trait CreationOutput: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn from_owned_va(va: u64) -> Self;
}

/// Outcome of a fallible native construction.
pub struct CreationResult<T: CreationOutput> {
    handle: NativeHandle,
    _marker: PhantomData<T>,
}

impl<T: CreationOutput> CreationResult<T> {
    pub(crate) fn from_va(va: u64) -> Self {
        Self {
            handle: NativeHandle::owned(va, |va| Ok(raw::result_free(GrResult::from_raw(va))?)),
            _marker: PhantomData,
        }
    }

    /// Whether a constructed object is still stored. A closed or drained
    /// result is simply not valid.
    pub fn is_valid(&self) -> bool {
        match self.handle.va() {
            Ok(va) => raw::result_is_valid(GrResult::from_raw(va)).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Whether the construction failed.
    pub fn has_error(&self) -> bool {
        match self.handle.va() {
            Ok(va) => raw::result_has_error(GrResult::from_raw(va)).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// The error message, or an empty string when there is none.
    pub fn get_error(&self) -> String {
        match self.handle.va() {
            Ok(va) => raw::result_error(GrResult::from_raw(va)).unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    /// Move the constructed object out, along with the reference the
    /// result was holding on it. Works exactly once: a second call, or
    /// a call on an error result, fails with `InvalidState`.
    pub fn get(&mut self) -> Result<T> {
        let va = self.handle.va()?;
        let value = raw::result_take_value(GrResult::from_raw(va))?;
        Ok(T::from_owned_va(value))
    }

    /// Free the result object. Releases a still-stored value.
    ///
    /// This is called automatically on drop, but can be called explicitly
    /// to handle any errors that may occur during release.
    pub fn close(&mut self) -> Result<()> {
        self.handle.close()
    }
}
