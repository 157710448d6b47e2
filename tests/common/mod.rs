#![allow(dead_code)]

use nodefs::{Filesystem, LocalAdapter, MemoryAdapter, PoolAdapter};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Facade over an in-memory tree holding the given directories and files
pub fn memory_fs(dirs: &[&str], files: &[(&str, &[u8])]) -> Filesystem<MemoryAdapter> {
    let adapter = MemoryAdapter::new();
    for dir in dirs {
        adapter.add_dir(dir);
    }
    for (path, content) in files {
        adapter.add_file(path, content);
    }
    Filesystem::new(adapter)
}

/// Facade over the local backend plus a scratch directory
pub fn local_fs() -> (TempDir, Filesystem<LocalAdapter>) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    (temp_dir, Filesystem::new(LocalAdapter::new()))
}

/// Facade over the worker-pool backend plus a scratch directory
pub fn pool_fs() -> (TempDir, Filesystem<PoolAdapter>) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let adapter = PoolAdapter::new().expect("Failed to start worker pool");
    (temp_dir, Filesystem::new(adapter))
}

/// Node path for `relative` inside `root`
pub fn node_path(root: &Path, relative: &str) -> String {
    root.join(relative)
        .to_str()
        .expect("temp paths are UTF-8")
        .to_string()
}

pub struct TestTimeoutGuard {
    cancelled: Arc<AtomicBool>,
}

impl Drop for TestTimeoutGuard {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Abort the test process if the guard is still alive after `duration`
///
/// A fan-in that never resolves would otherwise hang the test run.
pub fn test_timeout_guard(duration: Duration) -> TestTimeoutGuard {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = Arc::clone(&cancelled);
    std::thread::spawn(move || {
        std::thread::sleep(duration);
        if !cancelled_clone.load(Ordering::SeqCst) {
            eprintln!("Test timeout exceeded ({}s). Aborting.", duration.as_secs());
            std::process::abort();
        }
    });
    TestTimeoutGuard { cancelled }
}
