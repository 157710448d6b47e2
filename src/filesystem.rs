//! Filesystem facade
//!
//! [`Filesystem`] is the single entry point to a backend. It owns the
//! adapter, the [`FsConfig`] and the [`TypeRegistry`], hands out nodes, and
//! routes path-level requests to the adapter.
//!
//! Every result leaves the facade one scheduler tick after the adapter
//! produced it (see [`next_tick`]), so a caller never observes completion
//! inside the poll that issued the request, whatever the backend does.

use crate::config::FsConfig;
use crate::error::{FsError, Result};
use crate::node::{Directory, File, Node, TypeRegistry};
use crate::path::PathPolicy;
use crate::tick::next_tick;
use crate::traits::{Adapter, AdapterFile, DirEntry, OpenFlags, Stat};
use std::fmt;
use std::future::Future;
use std::io;
use std::rc::Rc;
use tracing::debug;

struct Inner<A> {
    adapter: A,
    config: FsConfig,
    registry: TypeRegistry,
    policy: PathPolicy,
}

/// Shared handle onto a backend adapter
///
/// Cloning is cheap: every clone and every node derived from it share the
/// same adapter, configuration and registry.
///
/// # Examples
///
/// ```rust,ignore
/// let fs = Filesystem::new(MemoryAdapter::new());
/// let dir = fs.dir("/var/data")?;
/// dir.create_recursive().await?;
/// let size = dir.size().await?;
/// ```
pub struct Filesystem<A> {
    inner: Rc<Inner<A>>,
}

impl<A> Clone for Filesystem<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: Adapter> fmt::Debug for Filesystem<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem")
            .field("adapter", &self.inner.adapter.name())
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<A: Adapter> Filesystem<A> {
    /// Create a facade with the default configuration and registry
    pub fn new(adapter: A) -> Self {
        let config = FsConfig::default();
        Self::build(adapter, config, TypeRegistry::default())
    }

    /// Create a facade with an explicit configuration and registry
    ///
    /// # Errors
    ///
    /// Returns `FsError::Config` if the configuration is invalid.
    pub fn with_config(adapter: A, config: FsConfig, registry: TypeRegistry) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(adapter, config, registry))
    }

    fn build(adapter: A, config: FsConfig, registry: TypeRegistry) -> Self {
        debug!(
            "filesystem facade on {} backend, separator {:?}",
            adapter.name(),
            config.separator
        );
        let policy = config.path_policy();
        Self {
            inner: Rc::new(Inner {
                adapter,
                config,
                registry,
                policy,
            }),
        }
    }

    /// The backend adapter
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.inner.adapter
    }

    /// The facade configuration
    #[must_use]
    pub fn config(&self) -> &FsConfig {
        &self.inner.config
    }

    /// The entry type registry used by listings
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.inner.registry
    }

    /// Path policy derived from the configured separator
    #[must_use]
    pub fn policy(&self) -> PathPolicy {
        self.inner.policy
    }

    /// Whether two handles share one facade
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Node constructors
    // ========================================================================

    /// Directory node at `path`; no I/O is performed
    ///
    /// # Errors
    ///
    /// Returns `FsError::PathResolution` if `path` cannot be normalized.
    pub fn dir(&self, path: &str) -> Result<Directory<A>> {
        let path = self.inner.policy.normalize(path)?;
        Ok(Directory::new(self.clone(), path))
    }

    /// File node at `path`; no I/O is performed
    ///
    /// # Errors
    ///
    /// Returns `FsError::PathResolution` if `path` cannot be normalized.
    pub fn file(&self, path: &str) -> Result<File<A>> {
        let path = self.inner.policy.normalize(path)?;
        Ok(File::new(self.clone(), path))
    }

    /// Stat `path` and materialize it through the registry
    ///
    /// # Errors
    ///
    /// Returns a backend error if the stat fails, or `FsError::PathResolution`
    /// if the entry type is not registered.
    pub async fn node(&self, path: &str) -> Result<Node<A>> {
        let path = self.resolve(path).await?;
        let stat = self.stat(&path).await?;
        match self.inner.registry.resolve(stat.entry_type) {
            Some(kind) => Ok(kind.materialize(self, path)),
            None => Err(FsError::path(
                path,
                format!("entry type {:?} is not registered", stat.entry_type),
            )),
        }
    }

    // ========================================================================
    // Delivery helpers
    // ========================================================================

    /// Normalize `path`, delivering a failure on the next tick
    pub(crate) async fn resolve(&self, path: &str) -> Result<String> {
        match self.inner.policy.normalize(path) {
            Ok(path) => Ok(path),
            Err(e) => {
                next_tick().await;
                Err(e)
            }
        }
    }

    /// Await an adapter future and hand its result on one tick later
    pub(crate) async fn settle<T>(
        &self,
        op: &'static str,
        path: &str,
        operation: impl Future<Output = io::Result<T>>,
    ) -> Result<T> {
        let result = operation.await;
        next_tick().await;
        result.map_err(|source| {
            debug!("{} {} failed for {}: {}", self.inner.adapter.name(), op, path, source);
            FsError::backend(op, path, source)
        })
    }

    // ========================================================================
    // Delegating primitives
    // ========================================================================

    /// Metadata of `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend stat fails.
    pub async fn stat(&self, path: &str) -> Result<Stat> {
        let path = self.resolve(path).await?;
        self.settle("stat", &path, self.inner.adapter.stat(&path))
            .await
    }

    /// Raw listing of `path`, unfiltered and in backend order
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend listing fails.
    pub async fn ls(&self, path: &str) -> Result<Vec<DirEntry>> {
        let path = self.resolve(path).await?;
        self.settle("ls", &path, self.inner.adapter.ls(&path)).await
    }

    /// Create one directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend mkdir fails.
    pub async fn mkdir(&self, path: &str, mode: u32) -> Result<()> {
        let path = self.resolve(path).await?;
        self.settle("mkdir", &path, self.inner.adapter.mkdir(&path, mode))
            .await
    }

    /// Remove one empty directory
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend rmdir fails.
    pub async fn rmdir(&self, path: &str) -> Result<()> {
        let path = self.resolve(path).await?;
        self.settle("rmdir", &path, self.inner.adapter.rmdir(&path))
            .await
    }

    /// Remove one non-directory entry
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend unlink fails.
    pub async fn unlink(&self, path: &str) -> Result<()> {
        let path = self.resolve(path).await?;
        self.settle("unlink", &path, self.inner.adapter.unlink(&path))
            .await
    }

    /// Change permission bits
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend chmod fails.
    pub async fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        let path = self.resolve(path).await?;
        self.settle("chmod", &path, self.inner.adapter.chmod(&path, mode))
            .await
    }

    /// Change ownership; `None` leaves that id unchanged
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend chown fails.
    pub async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        let path = self.resolve(path).await?;
        self.settle("chown", &path, self.inner.adapter.chown(&path, uid, gid))
            .await
    }

    /// Rename `from` to `to`
    ///
    /// # Errors
    ///
    /// Returns an error if either path is invalid or the backend rename fails.
    pub async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = self.resolve(from).await?;
        let to = self.resolve(to).await?;
        self.settle("rename", &from, self.inner.adapter.rename(&from, &to))
            .await
    }

    /// Create an empty file if missing
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend touch fails.
    pub async fn touch(&self, path: &str, mode: u32) -> Result<()> {
        let path = self.resolve(path).await?;
        self.settle("touch", &path, self.inner.adapter.touch(&path, mode))
            .await
    }

    /// Open a raw adapter handle
    ///
    /// # Errors
    ///
    /// Returns an error if the path is invalid or the backend open fails.
    pub async fn open(&self, path: &str, flags: OpenFlags) -> Result<A::File> {
        let path = self.resolve(path).await?;
        self.settle("open", &path, self.inner.adapter.open(&path, flags))
            .await
    }

    /// Read the whole content of the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if opening, reading or closing the file fails.
    pub async fn read_all(&self, path: &str) -> Result<Vec<u8>> {
        let path = self.resolve(path).await?;
        let file = self.open(&path, OpenFlags::read_only()).await?;
        let content = self
            .settle(
                "read",
                &path,
                file.read_to_end(self.inner.config.copy_chunk_size),
            )
            .await?;
        self.settle("close", &path, file.close()).await?;
        Ok(content)
    }

    /// Replace the content of the file at `path`, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns an error if opening, writing or closing the file fails.
    pub async fn write_all(&self, path: &str, data: &[u8]) -> Result<()> {
        let path = self.resolve(path).await?;
        let mut file = self.open(&path, OpenFlags::write_truncate()).await?;
        self.settle("write", &path, file.write_all_at(data, 0))
            .await?;
        self.settle("close", &path, file.close()).await
    }
}
