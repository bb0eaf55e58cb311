//! Error types for the granite crate.

use thiserror::Error;

/// Result type alias for granite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for granite operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Virtual address is zero, stale, or of the wrong kind.
    #[error("invalid handle")]
    InvalidHandle,

    /// Handle already carries a live address.
    #[error("handle already assigned")]
    AlreadyAssigned,

    /// Handle carries no address.
    #[error("handle not assigned")]
    UnassignedHandle,

    /// Object is live but in the wrong state for the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Lock released without a matching acquire, or in the wrong mode.
    #[error("lock misuse: {0}")]
    LockMisuse(String),

    /// Failure reported by the engine core.
    #[error("engine error: {0}")]
    Native(String),
}

impl Error {
    /// Check if this is an invalid handle error.
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Error::InvalidHandle)
    }

    /// Check if this is an invalid state error.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Error::InvalidState(_))
    }

    /// Check if this is a lock misuse error.
    pub fn is_lock_misuse(&self) -> bool {
        matches!(self, Error::LockMisuse(_))
    }
}
