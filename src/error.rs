//! Error types for filesystem node operations
//!
//! Every failure surfaced by the node layer is an [`FsError`]. Backend
//! failures keep the adapter's `io::Error` as their source so callers can
//! still match on [`std::io::ErrorKind`].

use std::io;
use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, FsError>;

/// Errors produced by the facade, nodes and the recursive invoker
#[derive(Debug, Error)]
pub enum FsError {
    /// The backend adapter's underlying operation failed
    #[error("{op} failed for {path}: {source}")]
    Backend {
        /// Name of the adapter primitive (`stat`, `mkdir`, ...)
        op: &'static str,
        /// Path the primitive was invoked on
        path: String,
        /// OS-level error reported by the adapter
        #[source]
        source: io::Error,
    },

    /// A path could not be normalized or a required relative could not be derived
    #[error("cannot resolve path {path:?}: {reason}")]
    PathResolution {
        /// The offending path as given
        path: String,
        /// Why resolution failed
        reason: String,
    },

    /// One of several concurrent operations under `path` failed
    #[error("operation under {path} failed: {source}")]
    Aggregate {
        /// Directory whose fan-out failed
        path: String,
        /// First error observed among the fanned-out operations
        #[source]
        source: Box<FsError>,
    },

    /// Invalid filesystem configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FsError {
    /// Build a backend error for `op` on `path`
    pub fn backend(op: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        Self::Backend {
            op,
            path: path.into(),
            source,
        }
    }

    /// Build a path resolution error
    pub fn path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PathResolution {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Wrap this error as the failure of a fan-out under `path`
    ///
    /// Aggregates are not nested: an error that already is an aggregate is
    /// returned unchanged, so the caller always sees the originating error one
    /// level down.
    #[must_use]
    pub fn aggregate(self, path: &str) -> Self {
        match self {
            aggregate @ Self::Aggregate { .. } => aggregate,
            other => Self::Aggregate {
                path: path.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The error that started it all, looking through aggregates
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Aggregate { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The underlying I/O error kind, if this originated in a backend
    #[must_use]
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        match self.root_cause() {
            Self::Backend { source, .. } => Some(source.kind()),
            _ => None,
        }
    }

    /// Whether the backend reported that the path does not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::NotFound)
    }

    /// Whether the backend reported that the path already exists
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.io_kind() == Some(io::ErrorKind::AlreadyExists)
    }
}
