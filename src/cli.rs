//! Command-line interface definitions
//!
//! This module organizes CLI arguments by **functional usage** - each group
//! contains the options needed by a specific component: backend selection,
//! facade configuration, output, and the subcommand itself.

use crate::config::{FsConfig, DEFAULT_COPY_CHUNK_SIZE};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Non-blocking filesystem operations over pluggable backends
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Backend selection
    #[command(flatten)]
    pub backend: BackendConfig,

    /// Facade configuration (modes, chunk size)
    #[command(flatten)]
    pub fs: FsOptions,

    /// Output and logging configuration
    #[command(flatten)]
    pub output: OutputConfig,

    /// Operation to run
    #[command(subcommand)]
    pub command: Command,
}

// ============================================================================
// FUNCTIONAL GROUPS: Organized by what component consumes them
// ============================================================================

/// Backend configuration
///
/// Used by: `main()` to build the adapter
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Backend Options")]
pub struct BackendConfig {
    /// Which adapter performs the I/O
    #[arg(long, value_enum, default_value = "local")]
    pub backend: BackendKind,
}

/// Available backend adapters
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum BackendKind {
    /// Event-driven `io_uring` backend
    Local,
    /// Blocking syscalls on a worker-thread pool
    Pool,
}

/// Facade configuration
///
/// Used by: `Filesystem::with_config()`
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Filesystem Options")]
pub struct FsOptions {
    /// Mode for directories created by mkdir (octal)
    #[arg(long, default_value = "755", value_parser = parse_mode)]
    pub dir_mode: u32,

    /// Mode for files created by touch (octal)
    #[arg(long, default_value = "644", value_parser = parse_mode)]
    pub file_mode: u32,

    /// Chunk size in KB for copying file content
    #[arg(long, default_value_t = DEFAULT_COPY_CHUNK_SIZE / 1024)]
    pub chunk_size_kb: usize,
}

impl FsOptions {
    /// Build the facade configuration
    #[must_use]
    pub fn to_config(&self) -> FsConfig {
        FsConfig {
            creation_mode: self.dir_mode,
            file_mode: self.file_mode,
            copy_chunk_size: self.chunk_size_kb.saturating_mul(1024),
            ..FsConfig::default()
        }
    }
}

/// Output and logging configuration
///
/// Used by: `main()`, logging initialization
#[derive(clap::Args, Debug, Clone)]
#[command(next_help_heading = "Output Options")]
pub struct OutputConfig {
    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List a directory
    Ls {
        /// Directory to list
        path: PathBuf,
    },
    /// Count entries and sum file sizes of a directory
    Size {
        /// Directory to measure
        path: PathBuf,
        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Create a directory
    Mkdir {
        /// Directory to create
        path: PathBuf,
        /// Create missing parents too
        #[arg(short, long)]
        parents: bool,
    },
    /// Remove a file or directory
    Rm {
        /// Entry to remove
        path: PathBuf,
        /// Remove a directory and everything below it
        #[arg(short, long)]
        recursive: bool,
    },
    /// Change permission bits
    Chmod {
        /// New mode (octal)
        #[arg(value_parser = parse_mode)]
        mode: u32,
        /// Entry to change
        path: PathBuf,
        /// Apply to a directory and everything below it
        #[arg(short = 'R', long)]
        recursive: bool,
    },
    /// Change ownership
    Chown {
        /// Entry to change
        path: PathBuf,
        /// New owner user id
        #[arg(long)]
        uid: Option<u32>,
        /// New owner group id
        #[arg(long)]
        gid: Option<u32>,
        /// Apply to a directory and everything below it
        #[arg(short = 'R', long)]
        recursive: bool,
    },
    /// Copy a file or directory
    Cp {
        /// Entry to copy
        source: PathBuf,
        /// Existing directory to copy into, or file to overwrite
        target: PathBuf,
    },
    /// Create an empty file if it is missing
    Touch {
        /// File to create
        path: PathBuf,
    },
    /// Print a file's content
    Cat {
        /// File to print
        path: PathBuf,
    },
}

/// Parse an octal permission mode such as `755` or `0o644`
///
/// # Errors
///
/// Returns an error message if the value is not octal or exceeds `0o7777`.
pub fn parse_mode(value: &str) -> std::result::Result<u32, String> {
    let digits = value.strip_prefix("0o").unwrap_or(value);
    let mode = u32::from_str_radix(digits, 8)
        .map_err(|e| format!("invalid octal mode {value:?}: {e}"))?;
    if mode > 0o7777 {
        return Err(format!("mode {value} exceeds 7777"));
    }
    Ok(mode)
}

// ============================================================================
// IMPLEMENTATION: Convenience methods and validation
// ============================================================================

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - Both --quiet and --verbose options are used
    /// - The chunk size is 0 or larger than 64 MB
    /// - `chown` is given neither --uid nor --gid
    pub fn validate(&self) -> Result<()> {
        if self.output.quiet && self.output.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        if self.fs.chunk_size_kb == 0 || self.fs.chunk_size_kb > 64 * 1024 {
            anyhow::bail!(
                "Chunk size must be between 1 KB and 64 MB, got: {} KB",
                self.fs.chunk_size_kb
            );
        }

        if let Command::Chown {
            uid: None,
            gid: None,
            ..
        } = self.command
        {
            anyhow::bail!("chown needs at least one of --uid or --gid");
        }

        Ok(())
    }

    /// Maximum log level for the verbosity flags
    #[must_use]
    pub const fn log_level(&self) -> tracing::Level {
        if self.output.quiet {
            return tracing::Level::ERROR;
        }
        match self.output.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

/// Turn a command-line path into an absolute node path
///
/// Relative paths are resolved against `cwd`.
///
/// # Errors
///
/// Returns an error if the path is not valid UTF-8.
pub fn node_path(path: &Path, cwd: &Path) -> Result<String> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    absolute
        .to_str()
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("path is not valid UTF-8: {}", absolute.display()))
}
