//! Directory nodes
//!
//! Listing, aggregate sizing and the recursive operations. Recursive work is
//! either done here (`create_recursive`, `size_recursive`) or handed to the
//! [`RecursiveInvoker`].

use super::{DirectorySize, File, FsNode, Listing, Node, RecursiveInvoker, RecursiveOp};
use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::tick::next_tick;
use crate::traits::Adapter;
use futures::future::{try_join, try_join_all, LocalBoxFuture};
use futures::FutureExt;
use std::fmt;
use tracing::{debug, trace};

/// A directory at a path on a [`Filesystem`]
pub struct Directory<A> {
    filesystem: Filesystem<A>,
    path: String,
}

impl<A: Adapter> Directory<A> {
    pub(crate) fn new(filesystem: Filesystem<A>, path: String) -> Self {
        Self { filesystem, path }
    }

    /// List the immediate children
    ///
    /// Entries whose backend type is not registered in the facade's
    /// [`TypeRegistry`](super::TypeRegistry) are dropped. The listing is
    /// materialized one scheduler tick after the backend answered.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend listing fails.
    pub async fn ls(&self) -> Result<Listing<A>> {
        let entries = self.filesystem.ls(&self.path).await?;
        next_tick().await;

        let registry = self.filesystem.registry();
        let policy = self.filesystem.policy();
        let nodes = entries
            .into_iter()
            .filter_map(|entry| match registry.resolve(entry.entry_type) {
                Some(kind) => Some(
                    kind.materialize(&self.filesystem, policy.join(&self.path, &entry.name)),
                ),
                None => {
                    trace!(
                        "dropping unregistered {:?} entry {} in {}",
                        entry.entry_type,
                        entry.name,
                        self.path
                    );
                    None
                }
            })
            .collect();

        Ok(Listing::new(nodes))
    }

    /// Count immediate children and sum the sizes of the files among them
    ///
    /// Only one level is inspected: subdirectories are counted but not
    /// descended into. File sizes are looked up concurrently.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails, or an aggregate error if any
    /// file size lookup fails.
    pub async fn size(&self) -> Result<DirectorySize> {
        let listing = self.ls().await?;

        let mut totals = DirectorySize::default();
        let mut files = Vec::new();
        for node in listing {
            match node {
                Node::Directory(_) => totals.directories += 1,
                Node::File(file) => {
                    totals.files += 1;
                    files.push(file);
                }
            }
        }

        let sizes = try_join_all(files.iter().map(|file| file.size()))
            .await
            .map_err(|e| e.aggregate(&self.path))?;
        totals.size = sizes.iter().sum();

        Ok(totals)
    }

    /// Like [`size`](Self::size) but over the whole subtree
    ///
    /// # Errors
    ///
    /// Returns an error if any listing or size lookup in the subtree fails.
    pub async fn size_recursive(&self) -> Result<DirectorySize> {
        size_subtree(self.clone()).await
    }

    /// Create this directory with the configured creation mode
    ///
    /// # Errors
    ///
    /// Returns an error if the backend `mkdir` fails (missing parent,
    /// existing entry, permissions).
    pub async fn create(&self) -> Result<()> {
        self.create_with_mode(self.filesystem.config().creation_mode)
            .await
    }

    /// Create this directory with an explicit mode
    ///
    /// # Errors
    ///
    /// Returns an error if the backend `mkdir` fails.
    pub async fn create_with_mode(&self, mode: u32) -> Result<()> {
        self.filesystem.mkdir(&self.path, mode).await
    }

    /// Remove this directory, which must be empty
    ///
    /// # Errors
    ///
    /// Returns an error if the backend `rmdir` fails.
    pub async fn remove(&self) -> Result<()> {
        self.filesystem.rmdir(&self.path).await
    }

    /// Create this directory and any missing ancestors, outermost first
    ///
    /// An ancestor that turns out to exist already when it is created (a
    /// concurrent call got there first) counts as success. The final
    /// `mkdir` of this directory reports every failure.
    ///
    /// # Errors
    ///
    /// Returns an error if any required `mkdir` fails.
    pub async fn create_recursive(&self) -> Result<()> {
        create_chain(self.clone()).await
    }

    /// Apply `chmod(mode)` to every descendant, then to this directory
    ///
    /// # Errors
    ///
    /// Returns an aggregate error if any descendant fails; this directory is
    /// then left untouched.
    pub async fn chmod_recursive(&self, mode: u32) -> Result<()> {
        RecursiveInvoker::new(self.clone())
            .execute(RecursiveOp::Chmod(mode))
            .await
    }

    /// Apply `chown(uid, gid)` to every descendant, then to this directory
    ///
    /// # Errors
    ///
    /// Returns an aggregate error if any descendant fails; this directory is
    /// then left untouched.
    pub async fn chown_recursive(&self, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        RecursiveInvoker::new(self.clone())
            .execute(RecursiveOp::Chown { uid, gid })
            .await
    }

    /// Remove every descendant, then this directory
    ///
    /// # Errors
    ///
    /// Returns an aggregate error if any descendant fails; this directory is
    /// then left in place.
    pub async fn remove_recursive(&self) -> Result<()> {
        RecursiveInvoker::new(self.clone())
            .execute(RecursiveOp::Remove)
            .await
    }
}

fn size_subtree<A: Adapter>(dir: Directory<A>) -> LocalBoxFuture<'static, Result<DirectorySize>> {
    async move {
        let listing = dir.ls().await?;

        let mut dirs = Vec::new();
        let mut files: Vec<File<A>> = Vec::new();
        for node in listing {
            match node {
                Node::Directory(sub) => dirs.push(sub),
                Node::File(file) => files.push(file),
            }
        }

        let (sizes, subtotals) = try_join(
            try_join_all(files.iter().map(|file| file.size())),
            try_join_all(dirs.iter().map(|sub| size_subtree(sub.clone()))),
        )
        .await
        .map_err(|e| e.aggregate(&dir.path))?;

        let mut totals = DirectorySize {
            directories: dirs.len() as u64,
            files: files.len() as u64,
            size: sizes.iter().sum(),
        };
        for subtotal in subtotals {
            totals += subtotal;
        }
        Ok(totals)
    }
    .boxed_local()
}

fn create_chain<A: Adapter>(dir: Directory<A>) -> LocalBoxFuture<'static, Result<()>> {
    async move {
        if let Some(parent) = dir.parent() {
            if let Err(err) = parent.stat().await {
                debug!("{} is missing ({}), creating it first", parent.path, err);
                match create_chain(parent.clone()).await {
                    Ok(()) => {}
                    Err(err) if err.is_already_exists() => {
                        debug!("{} was created concurrently", parent.path);
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        dir.create().await
    }
    .boxed_local()
}

impl<A: Adapter> FsNode for Directory<A> {
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

impl<A> Clone for Directory<A> {
    fn clone(&self) -> Self {
        Self {
            filesystem: self.filesystem.clone(),
            path: self.path.clone(),
        }
    }
}

impl<A: Adapter> PartialEq for Directory<A> {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path && self.filesystem.same(&other.filesystem)
    }
}

impl<A: Adapter> fmt::Debug for Directory<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Directory").field(&self.path).finish()
    }
}

impl<A: Adapter> fmt::Display for Directory<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}
