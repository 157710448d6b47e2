//! Local filesystem backend implementation
//!
//! This module provides an event-driven local backend. Content I/O and the
//! namespace operations io_uring supports (unlink, rmdir, rename, open) go
//! through compio's native operations. Syscalls without an io_uring opcode
//! (readdir, stat, mkdir with a mode, chmod, chown, touch) run on compio's
//! blocking thread pool and resume on the runtime thread.

use super::entry_name;
use crate::traits::{Adapter, AdapterFile, DirEntry, EntryType, OpenFlags, Stat};
use compio::buf::BufResult;
use compio::fs::{File, OpenOptions};
use compio::io::{AsyncReadAt, AsyncWriteAt};
use std::io;
use tracing::debug;

/// Run a blocking syscall on compio's blocking pool
async fn blocking<T, F>(op: F) -> io::Result<T>
where
    F: FnOnce() -> io::Result<T> + Send + 'static,
    T: Send + 'static,
{
    compio::runtime::spawn_blocking(op)
        .await
        .map_err(|e| io::Error::other(format!("spawn_blocking failed: {e:?}")))?
}

/// Local filesystem backend using compio
///
/// Node paths are used verbatim as host paths, so the facade should use the
/// `/` separator with this backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalAdapter;

impl LocalAdapter {
    /// Create a new `LocalAdapter`
    #[must_use]
    pub fn new() -> Self {
        debug!("creating local io_uring adapter");
        Self
    }
}

impl Adapter for LocalAdapter {
    type File = LocalFile;

    fn name(&self) -> &'static str {
        "local"
    }

    async fn stat(&self, path: &str) -> io::Result<Stat> {
        let path = path.to_string();
        blocking(move || std::fs::symlink_metadata(path).map(|m| Stat::from_std(&m))).await
    }

    async fn ls(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        let path = path.to_string();
        blocking(move || {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(&path)? {
                let entry = entry?;
                let Some(name) = entry_name(&path, entry.file_name()) else {
                    continue;
                };
                let entry_type = entry
                    .file_type()
                    .map_or(EntryType::Unknown, EntryType::from_file_type);
                entries.push(DirEntry::new(name, entry_type));
            }
            Ok(entries)
        })
        .await
    }

    async fn mkdir(&self, path: &str, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::DirBuilderExt;

        let path = path.to_string();
        blocking(move || std::fs::DirBuilder::new().mode(mode).create(path)).await
    }

    async fn rmdir(&self, path: &str) -> io::Result<()> {
        compio::fs::remove_dir(path).await
    }

    async fn unlink(&self, path: &str) -> io::Result<()> {
        compio::fs::remove_file(path).await
    }

    async fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let path = path.to_string();
        blocking(move || {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        })
        .await
    }

    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        let path = path.to_string();
        blocking(move || std::os::unix::fs::lchown(path, uid, gid)).await
    }

    async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        compio::fs::rename(from, to).await
    }

    async fn touch(&self, path: &str, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::OpenOptionsExt;

        let path = path.to_string();
        blocking(move || {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .mode(mode)
                .open(path)
                .map(drop)
        })
        .await
    }

    async fn open(&self, path: &str, flags: OpenFlags) -> io::Result<LocalFile> {
        let mut options = OpenOptions::new();
        options
            .read(flags.read)
            .write(flags.write)
            .create(flags.create)
            .truncate(flags.truncate);
        let file = options.open(path).await?;
        Ok(LocalFile { file })
    }
}

/// Local file handle using compio
#[derive(Debug)]
pub struct LocalFile {
    file: File,
}

impl AdapterFile for LocalFile {
    async fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let BufResult(result, buf) = self.file.read_at(Vec::with_capacity(len), offset).await;
        result?;
        Ok(buf)
    }

    async fn write_at(&mut self, data: Vec<u8>, offset: u64) -> io::Result<usize> {
        let BufResult(result, _) = self.file.write_at(data, offset).await;
        result
    }

    async fn close(self) -> io::Result<()> {
        self.file.close().await
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tempfile::TempDir;

    fn path_str(path: &std::path::Path) -> String {
        path.to_string_lossy().into_owned()
    }

    #[compio::test]
    async fn test_mkdir_stat_and_rmdir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = path_str(&temp_dir.path().join("sub"));
        let adapter = LocalAdapter::new();

        adapter.mkdir(&dir, 0o750).await.unwrap();
        let stat = adapter.stat(&dir).await.unwrap();
        assert!(stat.is_dir());

        adapter.rmdir(&dir).await.unwrap();
        let err = adapter.stat(&dir).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[compio::test]
    async fn test_ls_reports_entry_types() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("d")).unwrap();
        std::fs::write(temp_dir.path().join("f"), b"x").unwrap();
        let adapter = LocalAdapter::new();

        let mut entries = adapter.ls(&path_str(temp_dir.path())).await.unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(
            entries,
            vec![
                DirEntry::new("d", EntryType::Directory),
                DirEntry::new("f", EntryType::File),
            ]
        );
    }

    #[compio::test]
    async fn test_write_then_read_through_handles() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = path_str(&temp_dir.path().join("data.bin"));
        let adapter = LocalAdapter::new();

        let mut file = adapter
            .open(&file_path, OpenFlags::write_truncate())
            .await
            .unwrap();
        file.write_all_at(b"Hello, World!", 0).await.unwrap();
        file.close().await.unwrap();

        let file = adapter
            .open(&file_path, OpenFlags::read_only())
            .await
            .unwrap();
        assert_eq!(file.read_to_end(4).await.unwrap(), b"Hello, World!");
        assert!(file.read_at(13, 4).await.unwrap().is_empty());
    }

    #[compio::test]
    async fn test_touch_and_chmod() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("touched");
        let adapter = LocalAdapter::new();

        adapter.touch(&path_str(&file_path), 0o644).await.unwrap();
        adapter.chmod(&path_str(&file_path), 0o600).await.unwrap();

        let mode = std::fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
