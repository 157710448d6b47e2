//! Listing, sizing and recursive creation against the in-memory backend

#![allow(clippy::unwrap_used)]

mod common;

use common::{memory_fs, test_timeout_guard};
use nodefs::backends::OpKind;
use nodefs::{
    DirectorySize, EntryType, FsConfig, FsNode, Filesystem, MemoryAdapter, NodeKind,
    TypeRegistry,
};
use std::io;
use std::time::Duration;

#[compio::test]
async fn test_size_counts_one_level() {
    let _guard = test_timeout_guard(Duration::from_secs(10));
    let fs = memory_fs(&["/a/b"], &[("/a/c", b"0123456789")]);

    let size = fs.dir("/a").unwrap().size().await.unwrap();

    assert_eq!(
        size,
        DirectorySize {
            directories: 1,
            files: 1,
            size: 10
        }
    );
}

#[compio::test]
async fn test_size_sums_many_files() {
    let fs = memory_fs(
        &["/d/x", "/d/y"],
        &[("/d/f1", b"1"), ("/d/f2", b"22"), ("/d/f3", b"333")],
    );

    let size = fs.dir("/d").unwrap().size().await.unwrap();

    assert_eq!(size.directories, 2);
    assert_eq!(size.files, 3);
    assert_eq!(size.size, 6);
}

#[compio::test]
async fn test_size_of_empty_directory_resolves() {
    let _guard = test_timeout_guard(Duration::from_secs(10));
    let fs = memory_fs(&["/empty"], &[]);

    let size = fs.dir("/empty").unwrap().size().await.unwrap();
    assert_eq!(size, DirectorySize::default());
}

#[compio::test]
async fn test_size_rejects_when_a_file_lookup_fails() {
    let _guard = test_timeout_guard(Duration::from_secs(10));
    let fs = memory_fs(&[], &[("/a/ok", b"ok"), ("/a/bad", b"bad")]);
    fs.adapter()
        .fail(OpKind::Stat, "/a/bad", io::ErrorKind::PermissionDenied);

    let err = fs.dir("/a").unwrap().size().await.unwrap_err();
    assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
}

#[compio::test]
async fn test_ls_drops_unregistered_entries() {
    let adapter = MemoryAdapter::new();
    adapter.add_dir("/a/sub");
    adapter.add_file("/a/file", b"");
    adapter.add_entry("/a/pipe", EntryType::Fifo);
    adapter.add_entry("/a/link", EntryType::Symlink);
    adapter.add_entry("/a/sock", EntryType::Socket);
    let fs = Filesystem::new(adapter);

    let listing = fs.dir("/a").unwrap().ls().await.unwrap();

    assert_eq!(listing.len(), 2);
    assert!(listing.get("pipe").is_none());
    assert_eq!(listing.get("sub").unwrap().kind(), NodeKind::Directory);
    assert_eq!(listing.get("file").unwrap().kind(), NodeKind::File);
}

#[compio::test]
async fn test_custom_registry_materializes_extra_codes() {
    let adapter = MemoryAdapter::new();
    adapter.add_entry("/a/link", EntryType::Symlink);
    adapter.add_entry("/a/dev", EntryType::BlockDevice);
    let registry = TypeRegistry::default().with(EntryType::Symlink, NodeKind::File);
    let fs = Filesystem::with_config(adapter, FsConfig::default(), registry).unwrap();

    let listing = fs.dir("/a").unwrap().ls().await.unwrap();

    assert_eq!(listing.names(), vec!["link"]);
    assert!(listing.get("link").unwrap().is_file());
}

#[compio::test]
async fn test_ls_returns_fresh_nodes_each_time() {
    let fs = memory_fs(&["/a/one"], &[]);
    let dir = fs.dir("/a").unwrap();

    assert_eq!(dir.ls().await.unwrap().len(), 1);
    fs.adapter().add_dir("/a/two");
    assert_eq!(dir.ls().await.unwrap().len(), 2);
}

#[compio::test]
async fn test_ls_of_missing_directory_is_backend_error() {
    let fs = memory_fs(&[], &[]);
    let err = fs.dir("/nope").unwrap().ls().await.unwrap_err();
    assert!(err.is_not_found());
}

#[compio::test]
async fn test_create_recursive_creates_outermost_first() {
    let fs = memory_fs(&[], &[]);

    fs.dir("/x/y/z").unwrap().create_recursive().await.unwrap();

    assert_eq!(
        fs.adapter().operations_of(OpKind::Mkdir),
        vec!["/x", "/x/y", "/x/y/z"]
    );
    assert_eq!(fs.adapter().mode("/x/y"), Some(0o755));
}

#[compio::test]
async fn test_create_recursive_with_existing_parent_issues_one_mkdir() {
    let fs = memory_fs(&["/x/y"], &[]);

    fs.dir("/x/y/z").unwrap().create_recursive().await.unwrap();

    assert_eq!(fs.adapter().operations_of(OpKind::Mkdir), vec!["/x/y/z"]);
}

#[compio::test]
async fn test_create_recursive_uses_configured_mode() {
    let config = FsConfig {
        creation_mode: 0o700,
        ..FsConfig::default()
    };
    let fs = Filesystem::with_config(MemoryAdapter::new(), config, TypeRegistry::default())
        .unwrap();

    fs.dir("/p/q").unwrap().create_recursive().await.unwrap();
    assert_eq!(fs.adapter().mode("/p"), Some(0o700));
    assert_eq!(fs.adapter().mode("/p/q"), Some(0o700));
}

#[compio::test]
async fn test_overlapping_create_recursive_calls_both_succeed() {
    let fs = memory_fs(&[], &[]);
    let first = fs.dir("/shared/left").unwrap();
    let second = fs.dir("/shared/right").unwrap();

    let (a, b) = futures::join!(first.create_recursive(), second.create_recursive());

    a.unwrap();
    b.unwrap();
    assert!(fs.adapter().contains("/shared/left"));
    assert!(fs.adapter().contains("/shared/right"));
}

#[compio::test]
async fn test_create_without_parent_fails() {
    let fs = memory_fs(&[], &[]);
    let err = fs.dir("/x/y").unwrap().create().await.unwrap_err();
    assert!(err.is_not_found());
}

#[compio::test]
async fn test_custom_separator_paths() {
    let adapter = MemoryAdapter::with_separator('\\');
    adapter.add_file("\\data\\file", b"abc");
    let config = FsConfig {
        separator: '\\',
        ..FsConfig::default()
    };
    let fs = Filesystem::with_config(adapter, config, TypeRegistry::default()).unwrap();

    let dir = fs.dir("\\data\\").unwrap();
    let listing = dir.ls().await.unwrap();
    let file = listing.get("file").unwrap();

    assert_eq!(file.path(), "\\data\\file");
    assert_eq!(file.parent().unwrap(), dir);
    assert_eq!(dir.size().await.unwrap().size, 3);
}
