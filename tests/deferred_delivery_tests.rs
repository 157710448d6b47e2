//! Results are never delivered inside the poll that requested them

#![allow(clippy::unwrap_used)]

mod common;

use common::memory_fs;
use futures::task::noop_waker_ref;
use nodefs::FsNode;
use std::future::Future;
use std::pin::pin;
use std::task::{Context, Poll};

fn first_poll_is_pending<F: Future>(future: F) -> bool {
    let mut cx = Context::from_waker(noop_waker_ref());
    let mut future = pin!(future);
    future.as_mut().poll(&mut cx).is_pending()
}

#[test]
fn test_facade_primitives_are_deferred() {
    let fs = memory_fs(&["/a"], &[("/a/f", b"x")]);

    assert!(first_poll_is_pending(fs.stat("/a")));
    assert!(first_poll_is_pending(fs.ls("/a")));
    assert!(first_poll_is_pending(fs.mkdir("/b", 0o755)));
    assert!(first_poll_is_pending(fs.chmod("/a", 0o700)));
    assert!(first_poll_is_pending(fs.touch("/a/g", 0o644)));
}

#[test]
fn test_failures_are_deferred_too() {
    let fs = memory_fs(&[], &[]);

    assert!(first_poll_is_pending(fs.stat("/missing")));
    assert!(first_poll_is_pending(fs.stat("relative/path")));
}

#[test]
fn test_node_operations_are_deferred() {
    let fs = memory_fs(&["/a/b"], &[("/a/f", b"x")]);
    let dir = fs.dir("/a").unwrap();

    assert!(first_poll_is_pending(dir.ls()));
    assert!(first_poll_is_pending(dir.size()));
    assert!(first_poll_is_pending(dir.exists()));
    assert!(first_poll_is_pending(fs.file("/a/f").unwrap().size()));
}

#[test]
fn test_ls_takes_an_extra_tick_before_materializing() {
    let fs = memory_fs(&["/a/b"], &[]);
    let dir = fs.dir("/a").unwrap();

    let mut cx = Context::from_waker(noop_waker_ref());
    let mut listing = pin!(dir.ls());
    let mut polls = 1;
    while listing.as_mut().poll(&mut cx).is_pending() {
        polls += 1;
    }
    // One tick in the facade, one more before building nodes
    assert_eq!(polls, 3);
}

#[compio::test]
async fn test_deferred_results_still_arrive() {
    let fs = memory_fs(&["/a"], &[]);
    assert!(fs.stat("/a").await.unwrap().is_dir());
}
