//! Filesystem facade configuration
//!
//! Everything the node layer would otherwise take from platform globals
//! (the path separator, default creation modes) is injected through
//! [`FsConfig`].

use crate::error::{FsError, Result};
use crate::path::PathPolicy;

/// Default chunk size used when streaming file content during copies
pub const DEFAULT_COPY_CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Largest accepted copy chunk size
const MAX_COPY_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Configuration shared by a [`Filesystem`](crate::Filesystem) and every node derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsConfig {
    /// Path separator used to split, join and normalize node paths
    pub separator: char,
    /// Mode passed to `mkdir` by `Directory::create` and `create_recursive`
    pub creation_mode: u32,
    /// Mode passed to `touch` by `File::create`
    pub file_mode: u32,
    /// Chunk size for streaming copies
    pub copy_chunk_size: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            separator: '/',
            creation_mode: 0o755,
            file_mode: 0o644,
            copy_chunk_size: DEFAULT_COPY_CHUNK_SIZE,
        }
    }
}

impl FsConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `FsError::Config` if:
    /// - the separator is `.`, alphanumeric or whitespace
    /// - either mode has bits outside `0o7777`
    /// - the copy chunk size is 0 or larger than 64 MB
    pub fn validate(&self) -> Result<()> {
        if self.separator == '.'
            || self.separator.is_alphanumeric()
            || self.separator.is_whitespace()
        {
            return Err(FsError::Config(format!(
                "unusable path separator {:?}",
                self.separator
            )));
        }

        for (what, mode) in [("creation", self.creation_mode), ("file", self.file_mode)] {
            if mode & !0o7777 != 0 {
                return Err(FsError::Config(format!(
                    "{what} mode {mode:#o} has bits outside 0o7777"
                )));
            }
        }

        if self.copy_chunk_size == 0 || self.copy_chunk_size > MAX_COPY_CHUNK_SIZE {
            return Err(FsError::Config(format!(
                "copy chunk size must be between 1 byte and 64 MB, got: {}",
                self.copy_chunk_size
            )));
        }

        Ok(())
    }

    /// Path policy derived from the configured separator
    #[must_use]
    pub const fn path_policy(&self) -> PathPolicy {
        PathPolicy::new(self.separator)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(FsConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_alphanumeric_separator() {
        let config = FsConfig {
            separator: 'a',
            ..FsConfig::default()
        };
        assert!(matches!(config.validate(), Err(FsError::Config(_))));
    }

    #[test]
    fn test_rejects_oversized_mode() {
        let config = FsConfig {
            creation_mode: 0o17777,
            ..FsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        let config = FsConfig {
            copy_chunk_size: 0,
            ..FsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_windows_style_separator_is_accepted() {
        let config = FsConfig {
            separator: '\\',
            ..FsConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.path_policy().separator(), '\\');
    }
}
