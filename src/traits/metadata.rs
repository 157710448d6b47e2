//! Metadata and directory entry types reported by backend adapters
//!
//! Backends describe entries with an [`EntryType`] code. The node layer never
//! inspects backend-specific metadata; it only sees these types.

use std::fs;
use std::time::SystemTime;

/// Type code of a directory entry as reported by a backend
///
/// Mirrors the `DT_*` dirent codes so that eio-style backends can report
/// their raw code through [`EntryType::from_dirent_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryType {
    /// The backend could not tell
    Unknown,
    /// Named pipe
    Fifo,
    /// Character device
    CharDevice,
    /// Directory
    Directory,
    /// Block device
    BlockDevice,
    /// Regular file
    File,
    /// Symbolic link
    Symlink,
    /// Unix domain socket
    Socket,
}

impl EntryType {
    /// Map a raw `d_type` dirent code
    #[must_use]
    pub fn from_dirent_code(code: u8) -> Self {
        match code {
            libc::DT_FIFO => Self::Fifo,
            libc::DT_CHR => Self::CharDevice,
            libc::DT_DIR => Self::Directory,
            libc::DT_BLK => Self::BlockDevice,
            libc::DT_REG => Self::File,
            libc::DT_LNK => Self::Symlink,
            libc::DT_SOCK => Self::Socket,
            _ => Self::Unknown,
        }
    }

    /// The raw `d_type` dirent code for this type
    #[must_use]
    pub const fn dirent_code(self) -> u8 {
        match self {
            Self::Unknown => libc::DT_UNKNOWN,
            Self::Fifo => libc::DT_FIFO,
            Self::CharDevice => libc::DT_CHR,
            Self::Directory => libc::DT_DIR,
            Self::BlockDevice => libc::DT_BLK,
            Self::File => libc::DT_REG,
            Self::Symlink => libc::DT_LNK,
            Self::Socket => libc::DT_SOCK,
        }
    }

    /// Classify a `std::fs::FileType` (not following symlinks)
    #[must_use]
    pub fn from_file_type(file_type: fs::FileType) -> Self {
        use std::os::unix::fs::FileTypeExt;

        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else if file_type.is_fifo() {
            Self::Fifo
        } else if file_type.is_socket() {
            Self::Socket
        } else if file_type.is_char_device() {
            Self::CharDevice
        } else if file_type.is_block_device() {
            Self::BlockDevice
        } else {
            Self::Unknown
        }
    }
}

/// One row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (final path segment only)
    pub name: String,
    /// Backend-reported type code
    pub entry_type: EntryType,
}

impl DirEntry {
    /// Create a listing row
    pub fn new(name: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            name: name.into(),
            entry_type,
        }
    }
}

/// Result of a `stat` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stat {
    /// What kind of entry this is
    pub entry_type: EntryType,
    /// Size in bytes. For directories this is backend-defined.
    pub size: u64,
    /// Permission bits (e.g. `0o644`)
    pub mode: u32,
    /// Owner user id
    pub uid: u32,
    /// Owner group id
    pub gid: u32,
    /// Last modification time, if the backend reports one
    pub modified: Option<SystemTime>,
}

impl Stat {
    /// Convert `std::fs` metadata obtained without following symlinks
    #[must_use]
    pub fn from_std(metadata: &fs::Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            entry_type: EntryType::from_file_type(metadata.file_type()),
            size: metadata.len(),
            mode: metadata.mode() & 0o7777,
            uid: metadata.uid(),
            gid: metadata.gid(),
            modified: metadata.modified().ok(),
        }
    }

    /// Check if this is a directory
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Check if this is a regular file
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }
}

/// How an [`AdapterFile`](super::AdapterFile) handle is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags {
    /// Open for reading
    pub read: bool,
    /// Open for writing
    pub write: bool,
    /// Create the file if it does not exist
    pub create: bool,
    /// Truncate an existing file to zero length
    pub truncate: bool,
}

impl OpenFlags {
    /// Read an existing file
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            read: true,
            write: false,
            create: false,
            truncate: false,
        }
    }

    /// Write a file from scratch, creating it if needed
    #[must_use]
    pub const fn write_truncate() -> Self {
        Self {
            read: false,
            write: true,
            create: true,
            truncate: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirent_codes_round_trip() {
        for entry_type in [
            EntryType::Unknown,
            EntryType::Fifo,
            EntryType::CharDevice,
            EntryType::Directory,
            EntryType::BlockDevice,
            EntryType::File,
            EntryType::Symlink,
            EntryType::Socket,
        ] {
            assert_eq!(
                EntryType::from_dirent_code(entry_type.dirent_code()),
                entry_type
            );
        }
    }

    #[test]
    fn test_unrecognised_dirent_code_is_unknown() {
        assert_eq!(EntryType::from_dirent_code(200), EntryType::Unknown);
    }

    #[test]
    fn test_stat_from_std_file() {
        #![allow(clippy::unwrap_used)]
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();

        let stat = Stat::from_std(&std::fs::symlink_metadata(&path).unwrap());
        assert!(stat.is_file());
        assert!(!stat.is_dir());
        assert_eq!(stat.size, 10);
        assert!(stat.modified.is_some());
    }
}
