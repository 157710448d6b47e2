//! Ordering and failure behaviour of recursive chmod, chown and remove

#![allow(clippy::unwrap_used)]

mod common;

use common::{memory_fs, test_timeout_guard};
use nodefs::backends::{OpKind, Operation};
use nodefs::{FsError, RecursiveInvoker, RecursiveOp};
use std::io;
use std::time::Duration;

fn position(ops: &[Operation], kind: OpKind, path: &str) -> usize {
    ops.iter()
        .position(|op| op.kind == kind && op.path == path)
        .unwrap_or_else(|| unreachable!("{kind:?} {path} was never issued"))
}

#[compio::test]
async fn test_remove_recursive_orders_removals_bottom_up() {
    let _guard = test_timeout_guard(Duration::from_secs(10));
    let fs = memory_fs(&[], &[("/a/b/c.txt", b"c")]);

    fs.dir("/a").unwrap().remove_recursive().await.unwrap();

    let ops = fs.adapter().operations();
    let removals: Vec<&Operation> = ops
        .iter()
        .filter(|op| matches!(op.kind, OpKind::Unlink | OpKind::Rmdir))
        .collect();
    assert_eq!(
        removals,
        vec![
            &Operation {
                kind: OpKind::Unlink,
                path: "/a/b/c.txt".into()
            },
            &Operation {
                kind: OpKind::Rmdir,
                path: "/a/b".into()
            },
            &Operation {
                kind: OpKind::Rmdir,
                path: "/a".into()
            },
        ]
    );
    assert_eq!(fs.adapter().paths(), vec!["/"]);
}

#[compio::test]
async fn test_remove_recursive_issues_one_removal_per_node() {
    let fs = memory_fs(
        &["/r/d1/e", "/r/d2"],
        &[("/r/f1", b""), ("/r/d1/f2", b""), ("/r/d1/e/f3", b"")],
    );

    fs.dir("/r").unwrap().remove_recursive().await.unwrap();

    let unlinks = fs.adapter().operations_of(OpKind::Unlink);
    let rmdirs = fs.adapter().operations_of(OpKind::Rmdir);
    // 3 files + 3 subdirectories + the root of the invocation
    assert_eq!(unlinks.len() + rmdirs.len(), 1 + 6);
    assert_eq!(rmdirs.last().unwrap(), "/r");

    let ops = fs.adapter().operations();
    assert!(position(&ops, OpKind::Unlink, "/r/d1/e/f3") < position(&ops, OpKind::Rmdir, "/r/d1/e"));
    assert!(position(&ops, OpKind::Rmdir, "/r/d1/e") < position(&ops, OpKind::Rmdir, "/r/d1"));
    assert!(position(&ops, OpKind::Unlink, "/r/d1/f2") < position(&ops, OpKind::Rmdir, "/r/d1"));
}

#[compio::test]
async fn test_remove_recursive_of_empty_directory() {
    let fs = memory_fs(&["/lonely"], &[]);

    fs.dir("/lonely").unwrap().remove_recursive().await.unwrap();

    assert_eq!(fs.adapter().operations_of(OpKind::Rmdir), vec!["/lonely"]);
    assert!(!fs.adapter().contains("/lonely"));
}

#[compio::test]
async fn test_chmod_recursive_reaches_every_node() {
    let fs = memory_fs(&["/t/a/b"], &[("/t/a/b/f", b""), ("/t/g", b"")]);

    fs.dir("/t").unwrap().chmod_recursive(0o700).await.unwrap();

    for path in ["/t", "/t/a", "/t/a/b", "/t/a/b/f", "/t/g"] {
        assert_eq!(fs.adapter().mode(path), Some(0o700), "{path}");
    }
    let ops = fs.adapter().operations();
    assert!(position(&ops, OpKind::Chmod, "/t/a/b/f") < position(&ops, OpKind::Chmod, "/t/a/b"));
    assert!(position(&ops, OpKind::Chmod, "/t/a") < position(&ops, OpKind::Chmod, "/t"));
}

#[compio::test]
async fn test_chown_recursive_leaves_unset_ids_alone() {
    let fs = memory_fs(&["/o/sub"], &[("/o/sub/f", b"")]);

    fs.dir("/o").unwrap().chown_recursive(Some(42), None).await.unwrap();
    fs.dir("/o").unwrap().chown_recursive(None, Some(7)).await.unwrap();

    for path in ["/o", "/o/sub", "/o/sub/f"] {
        assert_eq!(fs.adapter().owner(path), Some((42, 7)), "{path}");
    }
}

#[compio::test]
async fn test_failed_descendant_blocks_ancestor_chmod() {
    let _guard = test_timeout_guard(Duration::from_secs(10));
    let fs = memory_fs(&["/t/a"], &[("/t/a/locked", b""), ("/t/free", b"")]);
    fs.adapter()
        .fail(OpKind::Chmod, "/t/a/locked", io::ErrorKind::PermissionDenied);

    let err = fs.dir("/t").unwrap().chmod_recursive(0o700).await.unwrap_err();

    assert!(matches!(err, FsError::Aggregate { .. }));
    assert!(matches!(err.root_cause(), FsError::Backend { op: "chmod", path, .. } if path == "/t/a/locked"));
    let chmods = fs.adapter().operations_of(OpKind::Chmod);
    assert!(!chmods.contains(&"/t/a".to_string()));
    assert!(!chmods.contains(&"/t".to_string()));
}

#[compio::test]
async fn test_failed_unlink_keeps_parents() {
    let fs = memory_fs(&[], &[("/a/b/stuck", b"")]);
    fs.adapter()
        .fail(OpKind::Unlink, "/a/b/stuck", io::ErrorKind::PermissionDenied);

    let err = fs.dir("/a").unwrap().remove_recursive().await.unwrap_err();

    assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
    assert!(fs.adapter().operations_of(OpKind::Rmdir).is_empty());
    assert!(fs.adapter().contains("/a/b"));
}

#[compio::test]
async fn test_listing_failure_of_subdirectory_is_aggregated() {
    let fs = memory_fs(&["/a/b"], &[]);
    fs.adapter().fail(OpKind::Ls, "/a/b", io::ErrorKind::PermissionDenied);

    let err = RecursiveInvoker::new(fs.dir("/a").unwrap())
        .execute(RecursiveOp::Remove)
        .await
        .unwrap_err();

    match err {
        FsError::Aggregate { path, source } => {
            assert_eq!(path, "/a");
            assert!(matches!(*source, FsError::Backend { op: "ls", .. }));
        }
        other => unreachable!("unexpected error {other:?}"),
    }
    assert!(fs.adapter().contains("/a"));
}

#[compio::test]
async fn test_unregistered_entries_make_remove_recursive_fail() {
    use nodefs::EntryType;

    let fs = memory_fs(&["/a"], &[]);
    fs.adapter().add_entry("/a/pipe", EntryType::Fifo);

    let err = fs.dir("/a").unwrap().remove_recursive().await.unwrap_err();

    assert_eq!(err.io_kind(), Some(io::ErrorKind::DirectoryNotEmpty));
    assert!(fs.adapter().contains("/a/pipe"));
}
