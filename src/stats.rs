//! Statistics tracking for copy operations
//!
//! This module provides lock-free statistics tracking using `SharedStats`.
//! One instance is shared by every branch of a copy fan-out.

use std::sync::atomic::{AtomicU64, Ordering};

/// Totals reported by a finished copy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    /// Regular files written at the destination
    pub files_copied: u64,
    /// Directories created (or reused) at the destination
    pub directories_created: u64,
    /// Content bytes written
    pub bytes_copied: u64,
}

/// Statistics tracking with interior mutability via atomics
///
/// Wrap in `Rc<SharedStats>` to share across the branches of a copy. Atomic
/// operations use `Ordering::Relaxed` since counters need no
/// synchronization with other memory.
///
/// # Usage
///
/// ```rust,ignore
/// let stats = Rc::new(SharedStats::new());
/// stats.increment_files_copied();
/// stats.increment_bytes_copied(1024);
/// let totals = stats.snapshot();
/// ```
#[derive(Debug, Default)]
pub struct SharedStats {
    files_copied: AtomicU64,
    directories_created: AtomicU64,
    bytes_copied: AtomicU64,
}

impl SharedStats {
    /// Create zeroed counters
    #[must_use]
    pub const fn new() -> Self {
        Self {
            files_copied: AtomicU64::new(0),
            directories_created: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
        }
    }

    /// Get the number of files copied
    #[must_use]
    pub fn files_copied(&self) -> u64 {
        self.files_copied.load(Ordering::Relaxed)
    }

    /// Get the number of directories created
    #[must_use]
    pub fn directories_created(&self) -> u64 {
        self.directories_created.load(Ordering::Relaxed)
    }

    /// Get the number of bytes copied
    #[must_use]
    pub fn bytes_copied(&self) -> u64 {
        self.bytes_copied.load(Ordering::Relaxed)
    }

    /// Increment the number of files copied
    pub fn increment_files_copied(&self) {
        self.files_copied.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the number of directories created
    pub fn increment_directories_created(&self) {
        self.directories_created.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment the number of bytes copied by a given amount
    pub fn increment_bytes_copied(&self, bytes: u64) {
        self.bytes_copied.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Current totals without consuming the counters
    #[must_use]
    pub fn snapshot(&self) -> CopyStats {
        CopyStats {
            files_copied: self.files_copied(),
            directories_created: self.directories_created(),
            bytes_copied: self.bytes_copied(),
        }
    }

    /// Convert the counters into final `CopyStats`
    #[must_use]
    pub fn into_inner(self) -> CopyStats {
        CopyStats {
            files_copied: self.files_copied.into_inner(),
            directories_created: self.directories_created.into_inner(),
            bytes_copied: self.bytes_copied.into_inner(),
        }
    }
}
