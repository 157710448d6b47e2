//! Node hierarchy
//!
//! A node is a path bound to a [`Filesystem`]. Nodes hold no resources and
//! cache nothing: every operation goes back to the backend, and listings
//! build fresh nodes each time.

pub mod copy;
pub mod directory;
pub mod file;
pub mod invoker;
pub mod registry;

pub use copy::CopyStream;
pub use directory::Directory;
pub use file::File;
pub use invoker::{RecursiveInvoker, RecursiveOp};
pub use registry::{NodeKind, TypeRegistry};

use crate::error::Result;
use crate::filesystem::Filesystem;
use crate::traits::{Adapter, Stat};
use std::fmt;

/// Operations shared by every node type
pub trait FsNode: Sized {
    /// Backend the node lives on
    type Adapter: Adapter;

    /// Absolute, normalized path
    fn path(&self) -> &str;

    /// Facade this node was created from
    fn filesystem(&self) -> &Filesystem<Self::Adapter>;

    /// A node of the same type at another path on the same facade
    #[must_use]
    fn at(&self, path: String) -> Self;

    /// Final path segment; empty for the root
    fn name(&self) -> &str {
        self.filesystem().policy().name(self.path())
    }

    /// Containing directory, derived from the path; `None` for the root
    fn parent(&self) -> Option<Directory<Self::Adapter>> {
        let parent = self.filesystem().policy().parent(self.path())?;
        Some(Directory::new(self.filesystem().clone(), parent))
    }

    /// Backend metadata for this node
    async fn stat(&self) -> Result<Stat> {
        self.filesystem().stat(self.path()).await
    }

    /// Whether anything exists at this path
    ///
    /// Only a "not found" failure maps to `false`; other failures propagate.
    async fn exists(&self) -> Result<bool> {
        match self.stat().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Change permission bits of this node only
    async fn chmod(&self, mode: u32) -> Result<()> {
        self.filesystem().chmod(self.path(), mode).await
    }

    /// Change ownership of this node only
    async fn chown(&self, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        self.filesystem().chown(self.path(), uid, gid).await
    }

    /// Move this node to the absolute path `to`, returning the moved node
    async fn rename(&self, to: &str) -> Result<Self> {
        let to = self.filesystem().resolve(to).await?;
        self.filesystem().rename(self.path(), &to).await?;
        Ok(self.at(to))
    }
}

/// A materialized listing entry
pub enum Node<A> {
    /// Directory node
    Directory(Directory<A>),
    /// File node
    File(File<A>),
}

impl<A: Adapter> Node<A> {
    /// The kind this node was materialized as
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Directory(_) => NodeKind::Directory,
            Self::File(_) => NodeKind::File,
        }
    }

    /// Borrow as a directory
    #[must_use]
    pub fn as_directory(&self) -> Option<&Directory<A>> {
        match self {
            Self::Directory(dir) => Some(dir),
            Self::File(_) => None,
        }
    }

    /// Borrow as a file
    #[must_use]
    pub fn as_file(&self) -> Option<&File<A>> {
        match self {
            Self::Directory(_) => None,
            Self::File(file) => Some(file),
        }
    }

    /// Check if this is a directory node
    #[must_use]
    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Check if this is a file node
    #[must_use]
    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl<A: Adapter> FsNode for Node<A> {
    type Adapter = A;

    fn path(&self) -> &str {
        match self {
            Self::Directory(dir) => dir.path(),
            Self::File(file) => file.path(),
        }
    }

    fn filesystem(&self) -> &Filesystem<A> {
        match self {
            Self::Directory(dir) => dir.filesystem(),
            Self::File(file) => file.filesystem(),
        }
    }

    fn at(&self, path: String) -> Self {
        match self {
            Self::Directory(dir) => Self::Directory(dir.at(path)),
            Self::File(file) => Self::File(file.at(path)),
        }
    }
}

impl<A> Clone for Node<A> {
    fn clone(&self) -> Self {
        match self {
            Self::Directory(dir) => Self::Directory(dir.clone()),
            Self::File(file) => Self::File(file.clone()),
        }
    }
}

impl<A: Adapter> PartialEq for Node<A> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Directory(a), Self::Directory(b)) => a == b,
            (Self::File(a), Self::File(b)) => a == b,
            _ => false,
        }
    }
}

impl<A: Adapter> fmt::Debug for Node<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(dir) => fmt::Debug::fmt(dir, f),
            Self::File(file) => fmt::Debug::fmt(file, f),
        }
    }
}

impl<A: Adapter> fmt::Display for Node<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Nodes produced by one [`Directory::ls`] call, in backend order
pub struct Listing<A> {
    nodes: Vec<Node<A>>,
}

impl<A: Adapter> Listing<A> {
    pub(crate) fn new(nodes: Vec<Node<A>>) -> Self {
        Self { nodes }
    }

    /// Node with the given entry name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Node<A>> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    /// Number of materialized entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing was materialized
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate the nodes in backend order
    pub fn iter(&self) -> std::slice::Iter<'_, Node<A>> {
        self.nodes.iter()
    }

    /// Entry names in backend order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.name()).collect()
    }
}

impl<A: Adapter> fmt::Debug for Listing<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.nodes.iter()).finish()
    }
}

impl<A> IntoIterator for Listing<A> {
    type Item = Node<A>;
    type IntoIter = std::vec::IntoIter<Node<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a, A> IntoIterator for &'a Listing<A> {
    type Item = &'a Node<A>;
    type IntoIter = std::slice::Iter<'a, Node<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

/// Totals reported by [`Directory::size`] and [`Directory::size_recursive`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorySize {
    /// Number of directories counted
    pub directories: u64,
    /// Number of files counted
    pub files: u64,
    /// Sum of the counted files' sizes in bytes
    pub size: u64,
}

impl std::ops::AddAssign for DirectorySize {
    fn add_assign(&mut self, other: Self) {
        self.directories += other.directories;
        self.files += other.files;
        self.size += other.size;
    }
}
