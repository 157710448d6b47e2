//! Adapter trait for pluggable filesystem backends
//!
//! This trait is the whole contract between the node layer and a backend.
//! It can be implemented with event-driven I/O (io_uring), a worker-thread
//! pool, subprocess delegation or an in-process store; the node layer does
//! not care which.

use std::io;

use super::{AdapterFile, DirEntry, OpenFlags, Stat};

/// Asynchronous filesystem primitives of one backend
///
/// Paths are absolute, already normalized node paths. Every method yields
/// exactly one result. Adapters may complete inline: the
/// [`Filesystem`](crate::Filesystem) facade defers delivery to the next
/// scheduler tick itself.
///
/// # Examples
///
/// ```rust,ignore
/// let adapter = LocalAdapter::new();
/// adapter.mkdir("/tmp/work", 0o755).await?;
/// for entry in adapter.ls("/tmp/work").await? {
///     println!("{} ({:?})", entry.name, entry.entry_type);
/// }
/// ```
pub trait Adapter: 'static {
    /// Handle type returned by [`open`](Self::open)
    type File: AdapterFile;

    /// Get the backend name for debugging/logging
    fn name(&self) -> &'static str;

    /// Get metadata for a path without following a final symlink
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or cannot be inspected.
    async fn stat(&self, path: &str) -> io::Result<Stat>;

    /// List the entries of a directory, excluding `.` and `..`
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a readable directory.
    async fn ls(&self, path: &str) -> io::Result<Vec<DirEntry>>;

    /// Create a single directory
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is missing or the path already exists.
    async fn mkdir(&self, path: &str, mode: u32) -> io::Result<()>;

    /// Remove an empty directory
    ///
    /// # Errors
    ///
    /// Returns an error if the directory doesn't exist or is not empty.
    async fn rmdir(&self, path: &str) -> io::Result<()>;

    /// Remove a non-directory entry
    ///
    /// # Errors
    ///
    /// Returns an error if the entry doesn't exist or is a directory.
    async fn unlink(&self, path: &str) -> io::Result<()>;

    /// Change permission bits
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or permission is denied.
    async fn chmod(&self, path: &str, mode: u32) -> io::Result<()>;

    /// Change ownership; `None` leaves that id unchanged
    ///
    /// # Errors
    ///
    /// Returns an error if the path doesn't exist or permission is denied.
    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> io::Result<()>;

    /// Rename `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns an error if `from` doesn't exist or `to` cannot be replaced.
    async fn rename(&self, from: &str, to: &str) -> io::Result<()>;

    /// Create an empty file if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if the parent is missing or the path is a directory.
    async fn touch(&self, path: &str, mode: u32) -> io::Result<()>;

    /// Open a file handle for streaming reads and writes
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened with `flags`.
    async fn open(&self, path: &str, flags: OpenFlags) -> io::Result<Self::File>;
}
