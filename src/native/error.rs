//! Error codes reported by the engine core.

use crate::error::Error;

/// Low-level failure code returned by `native::raw` calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawError {
    /// Address is zero, stale, or not present in the object table.
    InvalidHandle,
    /// Address resolves to an object of a different kind.
    WrongKind,
    /// Object exists but is in the wrong state for the operation.
    InvalidState,
    /// Unlock without a matching lock, or in the wrong mode.
    LockMisuse,
    /// A referenced body is not present.
    NotFound,
    /// The system's body capacity is exhausted.
    CapacityExceeded,
}

impl From<RawError> for Error {
    fn from(err: RawError) -> Self {
        match err {
            RawError::InvalidHandle | RawError::WrongKind => Error::InvalidHandle,
            RawError::InvalidState => Error::InvalidState("native object in the wrong state".into()),
            RawError::LockMisuse => Error::LockMisuse("unlock without a matching lock".into()),
            RawError::NotFound => Error::Native("body not present".into()),
            RawError::CapacityExceeded => Error::Native("body capacity exceeded".into()),
        }
    }
}
