//! Node-to-node copying
//!
//! Directories are copied top-down: the destination directory is created
//! first, then all children are copied concurrently. File content is
//! streamed through adapter handles in `copy_chunk_size` chunks, so a copy
//! may cross two facades that share an adapter type.
//!
//! `copy` resolves once with the final [`CopyStats`]. `copy_streaming` runs
//! the same work on a detached task and yields every destination node as
//! soon as it exists.

use super::{Directory, File, FsNode, Node};
use crate::error::{FsError, Result};
use crate::stats::{CopyStats, SharedStats};
use crate::traits::{Adapter, AdapterFile, OpenFlags};
use futures::channel::mpsc;
use futures::future::{try_join_all, LocalBoxFuture};
use futures::{FutureExt, Stream, StreamExt};
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use tracing::{debug, info};

/// Stream of destination nodes produced by a streaming copy
///
/// Yields each created directory and written file in creation order
/// (parents before their children). A failure is yielded as a final `Err`;
/// the stream then ends. Dropping the stream does not stop the copy.
pub struct CopyStream<A> {
    receiver: mpsc::UnboundedReceiver<Result<Node<A>>>,
}

impl<A> Stream for CopyStream<A> {
    type Item = Result<Node<A>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_next_unpin(cx)
    }
}

/// State shared by every branch of one copy
struct CopyContext<A> {
    stats: Rc<SharedStats>,
    sink: Option<mpsc::UnboundedSender<Result<Node<A>>>>,
}

impl<A> Clone for CopyContext<A> {
    fn clone(&self) -> Self {
        Self {
            stats: Rc::clone(&self.stats),
            sink: self.sink.clone(),
        }
    }
}

impl<A: Adapter> CopyContext<A> {
    fn new(sink: Option<mpsc::UnboundedSender<Result<Node<A>>>>) -> Self {
        Self {
            stats: Rc::new(SharedStats::new()),
            sink,
        }
    }

    fn emit(&self, node: Node<A>) {
        if let Some(sink) = &self.sink {
            // A closed receiver only means nobody is watching
            let _ = sink.unbounded_send(Ok(node));
        }
    }

    fn finish(&self, source: &str) -> CopyStats {
        let stats = self.stats.snapshot();
        info!(
            "copied {}: {} files, {} directories, {} bytes",
            source, stats.files_copied, stats.directories_created, stats.bytes_copied
        );
        stats
    }
}

impl<A: Adapter> File<A> {
    /// Copy this file onto `target`
    ///
    /// A directory target receives a file of the same name; a file target is
    /// overwritten.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the source or writing the destination fails.
    pub async fn copy(&self, target: &Node<A>) -> Result<CopyStats> {
        let ctx = CopyContext::new(None);
        copy_file(self, target, &ctx).await?;
        Ok(ctx.finish(self.path()))
    }

    /// Copy this file onto `target` on a detached task
    ///
    /// Must be called from within a compio runtime.
    #[must_use]
    pub fn copy_streaming(&self, target: &Node<A>) -> CopyStream<A> {
        let (source, target) = (self.clone(), target.clone());
        spawn_copy(move |ctx| {
            async move { copy_file(&source, &target, &ctx).await.map(drop) }.boxed_local()
        })
    }
}

impl<A: Adapter> Directory<A> {
    /// Copy this directory and its subtree into `target`
    ///
    /// The copy lands at `target/<name>`; copying the root copies its
    /// children straight into `target`. An existing directory at the
    /// destination is reused.
    ///
    /// # Errors
    ///
    /// Returns `FsError::PathResolution` if `target` lies inside this
    /// directory or the destination exists and is not a directory, and an
    /// aggregate error if any child fails.
    pub async fn copy(&self, target: &Directory<A>) -> Result<CopyStats> {
        let ctx = CopyContext::new(None);
        copy_directory(self.clone(), target.clone(), ctx.clone()).await?;
        Ok(ctx.finish(self.path()))
    }

    /// Copy this directory into `target` on a detached task
    ///
    /// Must be called from within a compio runtime.
    #[must_use]
    pub fn copy_streaming(&self, target: &Directory<A>) -> CopyStream<A> {
        let (source, target) = (self.clone(), target.clone());
        spawn_copy(move |ctx| copy_directory(source, target, ctx))
    }
}

impl<A: Adapter> Node<A> {
    /// Copy this node onto `target`
    ///
    /// # Errors
    ///
    /// Returns `FsError::PathResolution` when copying a directory onto a
    /// file, otherwise whatever [`File::copy`] or [`Directory::copy`] return.
    pub async fn copy(&self, target: &Node<A>) -> Result<CopyStats> {
        match (self, target) {
            (Self::File(file), target) => file.copy(target).await,
            (Self::Directory(dir), Self::Directory(target)) => dir.copy(target).await,
            (Self::Directory(dir), Self::File(target)) => Err(dir_onto_file(dir, target)),
        }
    }

    /// Copy this node onto `target` on a detached task
    ///
    /// Must be called from within a compio runtime.
    #[must_use]
    pub fn copy_streaming(&self, target: &Node<A>) -> CopyStream<A> {
        match (self, target) {
            (Self::File(file), target) => file.copy_streaming(target),
            (Self::Directory(dir), Self::Directory(target)) => dir.copy_streaming(target),
            (Self::Directory(dir), Self::File(target)) => {
                let err = dir_onto_file(dir, target);
                spawn_copy(move |_| async move { Err(err) }.boxed_local())
            }
        }
    }
}

fn dir_onto_file<A: Adapter>(dir: &Directory<A>, target: &File<A>) -> FsError {
    FsError::path(
        target.path(),
        format!("cannot copy directory {dir} onto a file"),
    )
}

fn spawn_copy<A, F>(job: F) -> CopyStream<A>
where
    A: Adapter,
    F: FnOnce(CopyContext<A>) -> LocalBoxFuture<'static, Result<()>>,
{
    let (sender, receiver) = mpsc::unbounded();
    let ctx = CopyContext::new(Some(sender.clone()));
    let work = job(ctx.clone());

    compio::runtime::spawn(async move {
        match work.await {
            Ok(()) => {
                ctx.finish("stream");
            }
            Err(err) => {
                debug!("streaming copy failed: {err}");
                let _ = sender.unbounded_send(Err(err));
            }
        }
    })
    .detach();

    CopyStream { receiver }
}

async fn copy_file<A: Adapter>(
    source: &File<A>,
    target: &Node<A>,
    ctx: &CopyContext<A>,
) -> Result<File<A>> {
    let destination = match target {
        Node::Directory(dir) => dir.filesystem().policy().join(dir.path(), source.name()),
        Node::File(file) => file.path().to_string(),
    };
    let destination = File::new(target.filesystem().clone(), destination);
    debug!("copying file {source} -> {destination}");

    let source_fs = source.filesystem();
    let target_fs = destination.filesystem();
    if source_fs.same(target_fs) && destination.path() == source.path() {
        return Err(FsError::path(
            destination.path(),
            format!("cannot copy {source} onto itself"),
        ));
    }

    let reader = source.open(OpenFlags::read_only()).await?;
    let mut writer = match destination.open(OpenFlags::write_truncate()).await {
        Ok(writer) => writer,
        Err(err) => {
            // The open failure takes precedence over a failed close
            let _ = source_fs
                .settle("close", source.path(), reader.close())
                .await;
            return Err(err);
        }
    };

    // Both handles are closed even when the transfer fails
    let transferred = transfer(source, &reader, &destination, &mut writer).await;
    let reader_closed = source_fs
        .settle("close", source.path(), reader.close())
        .await;
    let writer_closed = target_fs
        .settle("close", destination.path(), writer.close())
        .await;
    let offset = transferred?;
    reader_closed?;
    writer_closed?;

    ctx.stats.increment_files_copied();
    ctx.stats.increment_bytes_copied(offset);
    ctx.emit(Node::File(destination.clone()));
    Ok(destination)
}

/// Stream the content of `reader` into `writer`, returning the byte count
async fn transfer<A: Adapter>(
    source: &File<A>,
    reader: &A::File,
    destination: &File<A>,
    writer: &mut A::File,
) -> Result<u64> {
    let chunk_size = source.filesystem().config().copy_chunk_size;
    let mut offset = 0u64;
    loop {
        let chunk = source
            .filesystem()
            .settle("read", source.path(), reader.read_at(offset, chunk_size))
            .await?;
        if chunk.is_empty() {
            return Ok(offset);
        }
        destination
            .filesystem()
            .settle("write", destination.path(), writer.write_all_at(&chunk, offset))
            .await?;
        offset += chunk.len() as u64;
    }
}

fn copy_directory<A: Adapter>(
    source: Directory<A>,
    target: Directory<A>,
    ctx: CopyContext<A>,
) -> LocalBoxFuture<'static, Result<()>> {
    async move {
        let target_fs = target.filesystem();
        let policy = target_fs.policy();
        let destination = if source.name().is_empty() {
            target.clone()
        } else {
            Directory::new(target_fs.clone(), policy.join(target.path(), source.name()))
        };

        if source.filesystem().same(target_fs) && is_within(&source, &destination) {
            return Err(FsError::path(
                destination.path(),
                format!("cannot copy {source} into itself"),
            ));
        }

        debug!("copying directory {source} -> {destination}");
        match destination.create().await {
            Ok(()) => {}
            Err(err) if err.is_already_exists() => {
                if !destination.stat().await?.is_dir() {
                    return Err(FsError::path(
                        destination.path(),
                        "copy destination exists and is not a directory",
                    ));
                }
            }
            Err(err) => return Err(err),
        }
        ctx.stats.increment_directories_created();
        ctx.emit(Node::Directory(destination.clone()));

        let listing = source.ls().await?;
        try_join_all(listing.into_iter().map(|child| {
            let ctx = ctx.clone();
            let destination = destination.clone();
            async move {
                match child {
                    Node::Directory(sub) => copy_directory(sub, destination, ctx).await,
                    Node::File(file) => copy_file(&file, &Node::Directory(destination), &ctx)
                        .await
                        .map(drop),
                }
            }
        }))
        .await
        .map_err(|e| e.aggregate(source.path()))?;

        Ok(())
    }
    .boxed_local()
}

/// Whether `inner` is `outer` or lies below it
fn is_within<A: Adapter>(outer: &Directory<A>, inner: &Directory<A>) -> bool {
    let policy = outer.filesystem().policy();
    let mut current = Some(inner.path().to_string());
    while let Some(path) = current {
        if path == outer.path() {
            return true;
        }
        current = policy.parent(&path);
    }
    false
}
