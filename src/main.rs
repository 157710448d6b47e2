//! nodefs - command-line front end for the node layer

use anyhow::{Context, Result};
use clap::Parser;
use nodefs::cli::{node_path, Args, BackendKind, Command};
use nodefs::{Adapter, Filesystem, FsNode, LocalAdapter, Node, PoolAdapter, TypeRegistry};
use std::io::Write;
use std::path::Path;
use tracing::info;

#[compio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .with_writer(std::io::stderr)
        .init();

    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let config = args.fs.to_config();

    match args.backend.backend {
        BackendKind::Local => {
            let fs = Filesystem::with_config(LocalAdapter::new(), config, TypeRegistry::default())?;
            run(&fs, args.command, &cwd).await
        }
        BackendKind::Pool => {
            let adapter = PoolAdapter::new().context("failed to start worker pool")?;
            let fs = Filesystem::with_config(adapter, config, TypeRegistry::default())?;
            run(&fs, args.command, &cwd).await
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run<A: Adapter>(fs: &Filesystem<A>, command: Command, cwd: &Path) -> Result<()> {
    match command {
        Command::Ls { path } => {
            let dir = fs.dir(&node_path(&path, cwd)?)?;
            let listing = dir.ls().await?;
            let mut stdout = std::io::stdout().lock();
            for node in &listing {
                let marker = if node.is_directory() { "/" } else { "" };
                writeln!(stdout, "{}{marker}", node.name())?;
            }
        }
        Command::Size { path, recursive } => {
            let dir = fs.dir(&node_path(&path, cwd)?)?;
            let size = if recursive {
                dir.size_recursive().await?
            } else {
                dir.size().await?
            };
            println!(
                "directories: {}\nfiles: {}\nbytes: {}",
                size.directories, size.files, size.size
            );
        }
        Command::Mkdir { path, parents } => {
            let dir = fs.dir(&node_path(&path, cwd)?)?;
            if parents {
                dir.create_recursive().await?;
            } else {
                dir.create().await?;
            }
        }
        Command::Rm { path, recursive } => match fs.node(&node_path(&path, cwd)?).await? {
            Node::Directory(dir) if recursive => dir.remove_recursive().await?,
            Node::Directory(dir) => dir.remove().await?,
            Node::File(file) => file.remove().await?,
        },
        Command::Chmod {
            mode,
            path,
            recursive,
        } => match fs.node(&node_path(&path, cwd)?).await? {
            Node::Directory(dir) if recursive => dir.chmod_recursive(mode).await?,
            node => node.chmod(mode).await?,
        },
        Command::Chown {
            path,
            uid,
            gid,
            recursive,
        } => match fs.node(&node_path(&path, cwd)?).await? {
            Node::Directory(dir) if recursive => dir.chown_recursive(uid, gid).await?,
            node => node.chown(uid, gid).await?,
        },
        Command::Cp { source, target } => {
            let source = fs.node(&node_path(&source, cwd)?).await?;
            let target_path = node_path(&target, cwd)?;
            let target = match fs.node(&target_path).await {
                Ok(node) => node,
                Err(e) if e.is_not_found() => Node::File(fs.file(&target_path)?),
                Err(e) => return Err(e.into()),
            };
            let stats = source.copy(&target).await?;
            info!(
                "{} files, {} directories, {} bytes copied",
                stats.files_copied, stats.directories_created, stats.bytes_copied
            );
        }
        Command::Touch { path } => {
            fs.file(&node_path(&path, cwd)?)?.create().await?;
        }
        Command::Cat { path } => {
            let content = fs.file(&node_path(&path, cwd)?)?.read_all().await?;
            std::io::stdout().write_all(&content)?;
        }
    }
    Ok(())
}
