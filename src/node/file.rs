//! File nodes

use super::FsNode;
use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::traits::{Adapter, OpenFlags};
use std::fmt;

/// A non-directory entry at a path on a [`Filesystem`]
pub struct File<A> {
    filesystem: Filesystem<A>,
    path: String,
}

impl<A: Adapter> File<A> {
    pub(crate) fn new(filesystem: Filesystem<A>, path: String) -> Self {
        Self { filesystem, path }
    }

    /// Size in bytes as reported by `stat`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend stat fails.
    pub async fn size(&self) -> Result<u64> {
        Ok(self.stat().await?.size)
    }

    /// Create an empty file with the configured file mode if it is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the backend touch fails.
    pub async fn create(&self) -> Result<()> {
        self.filesystem
            .touch(&self.path, self.filesystem.config().file_mode)
            .await
    }

    /// Unlink this file
    ///
    /// # Errors
    ///
    /// Returns an error if the backend unlink fails.
    pub async fn remove(&self) -> Result<()> {
        self.filesystem.unlink(&self.path).await
    }

    /// Read the whole content
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub async fn read_all(&self) -> Result<Vec<u8>> {
        self.filesystem.read_all(&self.path).await
    }

    /// Replace the content, creating the file if needed
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or written.
    pub async fn write_all(&self, data: &[u8]) -> Result<()> {
        self.filesystem.write_all(&self.path, data).await
    }

    /// Open a raw adapter handle for positional I/O
    ///
    /// # Errors
    ///
    /// Returns an error if the backend open fails.
    pub async fn open(&self, flags: OpenFlags) -> Result<A::File> {
        self.filesystem.open(&self.path, flags).await
    }
}

impl<A: Adapter> FsNode for File<A> {
    type Adapter = A;

    fn path(&self) -> &str {
        &self.path
    }

    fn filesystem(&self) -> &Filesystem<A> {
        &self.filesystem
    }

    fn at(&self, path: String) -> Self {
        Self::new(self.filesystem.clone(), path)
    }
}

impl<A> Clone for File<A> {
    fn clone(&self) -> Self {
        Self {
            filesystem: self.filesystem.clone(),
            path: self.path.clone(),
        }
    }
}

impl<A: Adapter> PartialEq for File<A> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.filesystem.same(&other.filesystem)
    }
}

impl<A: Adapter> fmt::Debug for File<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("File").field(&self.path).finish()
    }
}

impl<A: Adapter> fmt::Display for File<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
