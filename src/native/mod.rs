//! Engine-core address space for Granite.
//!
//! This module contains the low-level object table and the per-operation
//! call surface. Users should prefer the safe Rust wrappers in the parent
//! modules.

pub mod error;
pub mod handles;
mod heap;
pub mod raw;

pub use error::RawError;
pub use handles::*;
