//! Recursive invoker
//!
//! Applies one operation to a whole subtree, bottom-up: a directory's
//! children (and their subtrees) are all processed concurrently, and the
//! directory itself is only touched once every one of them has succeeded.
//! The first failure rejects the whole invocation and nothing above the
//! failing node is attempted. There is no rollback.

use super::{Directory, File, FsNode, Node};
use crate::error::Result;
use crate::traits::Adapter;
use futures::future::{try_join_all, LocalBoxFuture};
use futures::FutureExt;
use std::fmt;
use tracing::debug;

/// Operation applied to every node of a subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursiveOp {
    /// Change permission bits
    Chmod(u32),
    /// Change ownership; `None` leaves that id unchanged
    Chown {
        /// New owner user id
        uid: Option<u32>,
        /// New owner group id
        gid: Option<u32>,
    },
    /// Unlink files, then remove directories
    Remove,
}

impl RecursiveOp {
    async fn apply_to_file<A: Adapter>(self, file: &File<A>) -> Result<()> {
        match self {
            Self::Chmod(mode) => file.chmod(mode).await,
            Self::Chown { uid, gid } => file.chown(uid, gid).await,
            Self::Remove => file.remove().await,
        }
    }

    async fn apply_to_directory<A: Adapter>(self, dir: &Directory<A>) -> Result<()> {
        match self {
            Self::Chmod(mode) => dir.chmod(mode).await,
            Self::Chown { uid, gid } => dir.chown(uid, gid).await,
            Self::Remove => dir.remove().await,
        }
    }
}

impl fmt::Display for RecursiveOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chmod(mode) => write!(f, "chmod {mode:o}"),
            Self::Chown { uid, gid } => write!(f, "chown {uid:?}:{gid:?}"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// Runs a [`RecursiveOp`] over the subtree rooted at a directory
#[derive(Debug)]
pub struct RecursiveInvoker<A: Adapter> {
    directory: Directory<A>,
}

impl<A: Adapter> RecursiveInvoker<A> {
    /// Target the subtree rooted at `directory`
    #[must_use]
    pub fn new(directory: Directory<A>) -> Self {
        Self { directory }
    }

    /// Apply `op` to every descendant, then to the directory itself
    ///
    /// # Errors
    ///
    /// Returns the listing error of the root directory, or an
    /// `FsError::Aggregate` wrapping the first descendant failure, or the
    /// failure of the final operation on the directory itself.
    pub async fn execute(&self, op: RecursiveOp) -> Result<()> {
        execute_on(self.directory.clone(), op).await
    }
}

fn execute_on<A: Adapter>(dir: Directory<A>, op: RecursiveOp) -> LocalBoxFuture<'static, Result<()>> {
    async move {
        debug!("{op} under {dir}");
        let listing = dir.ls().await?;

        try_join_all(listing.into_iter().map(|child| async move {
            match child {
                Node::Directory(sub) => execute_on(sub, op).await,
                Node::File(file) => op.apply_to_file(&file).await,
            }
        }))
        .await
        .map_err(|e| e.aggregate(dir.path()))?;

        op.apply_to_directory(&dir).await?;
        debug!("{op} done for {dir}");
        Ok(())
    }
    .boxed_local()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::backends::{MemoryAdapter, OpKind};
    use crate::error::FsError;
    use crate::Filesystem;
    use std::io;

    #[compio::test]
    async fn test_chmod_applies_children_before_parent() {
        let adapter = MemoryAdapter::new();
        adapter.add_file("/t/sub/f", b"");
        adapter.add_file("/t/g", b"");
        let fs = Filesystem::new(adapter);

        RecursiveInvoker::new(fs.dir("/t").unwrap())
            .execute(RecursiveOp::Chmod(0o700))
            .await
            .unwrap();

        let chmods = fs.adapter().operations_of(OpKind::Chmod);
        assert_eq!(chmods.len(), 4);
        assert_eq!(chmods.last().unwrap(), "/t");
        let pos = |p: &str| chmods.iter().position(|c| c == p).unwrap();
        assert!(pos("/t/sub/f") < pos("/t/sub"));
        assert_eq!(fs.adapter().mode("/t/sub/f"), Some(0o700));
    }

    #[compio::test]
    async fn test_failure_skips_ancestors() {
        let adapter = MemoryAdapter::new();
        adapter.add_file("/t/sub/f", b"");
        adapter.fail(OpKind::Chown, "/t/sub/f", io::ErrorKind::PermissionDenied);
        let fs = Filesystem::new(adapter);

        let err = fs
            .dir("/t")
            .unwrap()
            .chown_recursive(Some(1), None)
            .await
            .unwrap_err();

        assert!(matches!(err, FsError::Aggregate { ref path, .. } if path == "/t/sub"));
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert_eq!(fs.adapter().operations_of(OpKind::Chown), vec!["/t/sub/f"]);
    }

    #[test]
    fn test_display() {
        assert_eq!(RecursiveOp::Chmod(0o755).to_string(), "chmod 755");
        assert_eq!(RecursiveOp::Remove.to_string(), "remove");
    }
}
