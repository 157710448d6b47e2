//! Worker-pool backend implementation
//!
//! Every primitive runs as a plain blocking `std::fs` call on a compio
//! `Dispatcher` worker thread. The result travels back over the dispatcher's
//! oneshot channel and is awaited on the caller's runtime, so the caller's
//! thread never blocks.

use super::entry_name;
use crate::traits::{Adapter, AdapterFile, DirEntry, EntryType, OpenFlags, Stat};
use compio::dispatcher::Dispatcher;
use std::io;
use std::os::unix::fs::FileExt;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;

/// Thread-pool backend using a compio `Dispatcher`
pub struct PoolAdapter {
    dispatcher: Rc<Dispatcher>,
}

impl std::fmt::Debug for PoolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolAdapter").finish_non_exhaustive()
    }
}

impl PoolAdapter {
    /// Create a pool adapter with the dispatcher's default worker count
    ///
    /// # Errors
    ///
    /// Returns an error if the worker threads cannot be spawned.
    pub fn new() -> io::Result<Self> {
        let dispatcher = Dispatcher::new()?;
        debug!("creating worker-pool adapter");
        Ok(Self {
            dispatcher: Rc::new(dispatcher),
        })
    }
}

/// Run `op` on a dispatcher worker and await its result
async fn run<T, F>(dispatcher: &Dispatcher, op: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let receiver = dispatcher
        .dispatch(move || async move { op() })
        .map_err(|e| io::Error::other(format!("Failed to dispatch operation: {e:?}")))?;

    receiver
        .await
        .map_err(|e| io::Error::other(format!("Worker channel failed: {e:?}")))?
}

impl Adapter for PoolAdapter {
    type File = PoolFile;

    fn name(&self) -> &'static str {
        "pool"
    }

    async fn stat(&self, path: &str) -> io::Result<Stat> {
        let path = path.to_string();
        run(&self.dispatcher, move || {
            std::fs::symlink_metadata(path).map(|m| Stat::from_std(&m))
        })
        .await
    }

    async fn ls(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let path = path.to_string();
        run(&self.dispatcher, move || {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(&path)? {
                let entry = entry?;
                if let Some(name) = entry_name(&path, entry.file_name()) {
                    let entry_type = entry
                        .file_type()
                        .map_or(EntryType::Unknown, EntryType::from_file_type);
                    entries.push(DirEntry::new(name, entry_type));
                }
            }
            Ok(entries)
        })
        .await
    }

    async fn mkdir(&self, path: &str, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::DirBuilderExt;

        let path = path.to_string();
        run(&self.dispatcher, move || {
            std::fs::DirBuilder::new().mode(mode).create(path)
        })
        .await
    }

    async fn rmdir(&self, path: &str) -> io::Result<()> {
        let path = path.to_string();
        run(&self.dispatcher, move || std::fs::remove_dir(path)).await
    }

    async fn unlink(&self, path: &str) -> io::Result<()> {
        let path = path.to_string();
        run(&self.dispatcher, move || std::fs::remove_file(path)).await
    }

    async fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let path = path.to_string();
        run(&self.dispatcher, move || {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        })
        .await
    }

    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        let path = path.to_string();
        run(&self.dispatcher, move || {
            std::os::unix::fs::lchown(path, uid, gid)
        })
        .await
    }

    async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        let (from, to) = (from.to_string(), to.to_string());
        run(&self.dispatcher, move || std::fs::rename(from, to)).await
    }

    async fn touch(&self, path: &str, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::OpenOptionsExt;

        let path = path.to_string();
        run(&self.dispatcher, move || {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .mode(mode)
                .open(path)
                .map(drop)
        })
        .await
    }

    async fn open(&self, path: &str, flags: OpenFlags) -> io::Result<PoolFile> {
        let path = path.to_string();
        let file = run(&self.dispatcher, move || {
            std::fs::OpenOptions::new()
                .read(flags.read)
                .write(flags.write)
                .create(flags.create)
                .truncate(flags.truncate)
                .open(path)
        })
        .await?;
        Ok(PoolFile {
            file: Arc::new(file),
            dispatcher: Rc::clone(&self.dispatcher),
        })
    }
}

/// File handle whose reads and writes run on the adapter's workers
pub struct PoolFile {
    file: Arc<std::fs::File>,
    dispatcher: Rc<Dispatcher>,
}

impl std::fmt::Debug for PoolFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolFile")
            .field("file", &self.file)
            .finish_non_exhaustive()
    }
}

impl AdapterFile for PoolFile {
    async fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let file = Arc::clone(&self.file);
        run(&self.dispatcher, move || {
            let mut buf = vec![0u8; len];
            let read = file.read_at(&mut buf, offset)?;
            buf.truncate(read);
            Ok(buf)
        })
        .await
    }

    async fn write_at(&mut self, data: Vec<u8>, offset: u64) -> io::Result<usize> {
        let file = Arc::clone(&self.file);
        run(&self.dispatcher, move || file.write_at(&data, offset)).await
    }

    async fn close(self) -> io::Result<()> {
        let file = self.file;
        run(&self.dispatcher, move || {
            file.sync_all()?;
            drop(file);
            Ok(())
        })
        .await
    }
}
