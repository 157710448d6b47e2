//! Filesystem backend implementations
//!
//! This module provides concrete implementations of the [`Adapter`](crate::traits::Adapter)
//! trait: an event-driven local backend, a worker-pool backend and an
//! in-memory backend for tests and embedding.

pub mod local;
pub mod memory;
pub mod pool;

// Re-export main types for convenience
pub use local::{LocalAdapter, LocalFile};
pub use memory::{MemoryAdapter, MemoryFile, OpKind, Operation};
pub use pool::{PoolAdapter, PoolFile};

use std::ffi::OsString;
use tracing::trace;

/// UTF-8 name of a listed entry, or `None` for names nodes cannot address
///
/// Node paths are strings, so an undecodable name is dropped from the
/// listing the same way an unregistered entry type is.
pub(crate) fn entry_name(dir: &str, name: OsString) -> Option<String> {
    match name.into_string() {
        Ok(name) => Some(name),
        Err(raw) => {
            trace!("skipping non-UTF-8 entry {:?} in {}", raw, dir);
            None
        }
    }
}
