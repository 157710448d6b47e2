//! Backend adapter contract
//!
//! This module provides the traits and value types a backend implements so
//! that nodes can work against it. The traits are designed to work with
//! compio's single-threaded async model: no `Send` bound is required.

pub mod adapter;
pub mod file;
pub mod metadata;

// Re-export main traits for convenience
pub use adapter::Adapter;
pub use file::AdapterFile;
pub use metadata::{DirEntry, EntryType, OpenFlags, Stat};
