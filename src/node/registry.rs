//! Entry type registry
//!
//! Maps the type codes a backend reports in its listings onto the node kinds
//! the crate knows how to build. Listing entries whose code is not registered
//! are dropped by [`Directory::ls`](super::Directory::ls).

use super::{Directory, File, Node};
use crate::filesystem::Filesystem;
use crate::traits::{Adapter, EntryType};
use std::collections::HashMap;

/// Node constructor selected for a backend type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Build a [`Directory`]
    Directory,
    /// Build a [`File`]
    File,
}

impl NodeKind {
    /// Build a node of this kind at `path`
    #[must_use]
    pub fn materialize<A: Adapter>(self, filesystem: &Filesystem<A>, path: String) -> Node<A> {
        match self {
            Self::Directory => Node::Directory(Directory::new(filesystem.clone(), path)),
            Self::File => Node::File(File::new(filesystem.clone(), path)),
        }
    }
}

/// Mapping from [`EntryType`] to [`NodeKind`]
///
/// The default registry knows directories and regular files. Other codes
/// (symlinks, sockets, devices, fifos) can be mapped onto an existing kind:
///
/// ```rust,ignore
/// let registry = TypeRegistry::default().with(EntryType::Symlink, NodeKind::File);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    kinds: HashMap<EntryType, NodeKind>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::empty()
            .with(EntryType::Directory, NodeKind::Directory)
            .with(EntryType::File, NodeKind::File)
    }
}

impl TypeRegistry {
    /// A registry that materializes nothing
    #[must_use]
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register `entry_type`, returning the kind it was previously mapped to
    pub fn register(&mut self, entry_type: EntryType, kind: NodeKind) -> Option<NodeKind> {
        self.kinds.insert(entry_type, kind)
    }

    /// Builder form of [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, entry_type: EntryType, kind: NodeKind) -> Self {
        self.register(entry_type, kind);
        self
    }

    /// Stop materializing `entry_type`
    pub fn unregister(&mut self, entry_type: EntryType) -> Option<NodeKind> {
        self.kinds.remove(&entry_type)
    }

    /// Kind registered for `entry_type`
    #[must_use]
    pub fn resolve(&self, entry_type: EntryType) -> Option<NodeKind> {
        self.kinds.get(&entry_type).copied()
    }

    /// Whether `entry_type` is materialized
    #[must_use]
    pub fn is_registered(&self, entry_type: EntryType) -> bool {
        self.kinds.contains_key(&entry_type)
    }
}
