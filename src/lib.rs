//! nodefs - non-blocking filesystem nodes over pluggable backends
//!
//! Files and directories are manipulated through futures while the actual
//! I/O is delegated to a backend [`Adapter`]: an event-driven `io_uring`
//! backend ([`LocalAdapter`]), a worker-thread pool ([`PoolAdapter`]), or an
//! in-process tree ([`MemoryAdapter`]).
//!
//! On top of the adapter sits the [`Filesystem`] facade and the node layer:
//! [`Directory`] listing and sizing, and recursive create, chmod, chown and
//! remove that fan out over children concurrently while keeping parent and
//! child operations correctly ordered.
//!
//! ```rust,ignore
//! let fs = Filesystem::new(LocalAdapter::new());
//! let dir = fs.dir("/tmp/scratch/a/b")?;
//! dir.create_recursive().await?;
//! fs.dir("/tmp/scratch")?.remove_recursive().await?;
//! ```

#![allow(async_fn_in_trait)]

pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod filesystem;
pub mod node;
pub mod path;
pub mod stats;
pub mod tick;
pub mod traits;

pub use backends::{LocalAdapter, MemoryAdapter, PoolAdapter};
pub use config::FsConfig;
pub use error::{FsError, Result};
pub use filesystem::Filesystem;
pub use node::{
    CopyStream, Directory, DirectorySize, File, FsNode, Listing, Node, NodeKind, RecursiveInvoker,
    RecursiveOp, TypeRegistry,
};
pub use stats::CopyStats;
pub use traits::{Adapter, AdapterFile, DirEntry, EntryType, OpenFlags, Stat};
