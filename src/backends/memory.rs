//! In-memory backend
//!
//! Keeps a whole tree in process. Every primitive is recorded in an
//! operation log and failures can be injected per operation and path, which
//! makes this the backend of choice for verifying ordering and failure
//! behaviour of the node layer. Operations complete inline; the facade takes
//! care of deferring their delivery.

use crate::traits::{Adapter, AdapterFile, DirEntry, EntryType, OpenFlags, Stat};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::rc::Rc;
use std::time::SystemTime;

/// Primitive recorded in the operation log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    /// `stat`
    Stat,
    /// `ls`
    Ls,
    /// `mkdir`
    Mkdir,
    /// `rmdir`
    Rmdir,
    /// `unlink`
    Unlink,
    /// `chmod`
    Chmod,
    /// `chown`
    Chown,
    /// `rename` (logged with the source path)
    Rename,
    /// `touch`
    Touch,
    /// `open`
    Open,
    /// `read_at` on a handle
    Read,
    /// `write_at` on a handle
    Write,
    /// `close` on a handle
    Close,
}

/// One logged primitive invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// Which primitive ran
    pub kind: OpKind,
    /// Path it ran on
    pub path: String,
}

#[derive(Debug, Clone)]
struct MemEntry {
    entry_type: EntryType,
    content: Rc<RefCell<Vec<u8>>>,
    mode: u32,
    uid: u32,
    gid: u32,
    modified: SystemTime,
}

impl MemEntry {
    fn new(entry_type: EntryType, mode: u32) -> Self {
        Self {
            entry_type,
            content: Rc::new(RefCell::new(Vec::new())),
            mode,
            uid: 0,
            gid: 0,
            modified: SystemTime::now(),
        }
    }

    fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

#[derive(Debug, Default)]
struct State {
    entries: BTreeMap<String, MemEntry>,
    log: Vec<Operation>,
    failures: Vec<(OpKind, String, io::ErrorKind)>,
}

impl State {
    /// Log the call and apply any injected failure
    fn begin(&mut self, kind: OpKind, path: &str) -> io::Result<()> {
        self.log.push(Operation {
            kind,
            path: path.to_string(),
        });
        match self
            .failures
            .iter()
            .find(|(op, failing, _)| *op == kind && failing == path)
        {
            Some((_, _, error)) => Err(io::Error::new(
                *error,
                format!("injected {kind:?} failure for {path}"),
            )),
            None => Ok(()),
        }
    }
}

/// In-process backend with an operation log and failure injection
///
/// Fixture helpers (`add_dir`, `add_file`, `add_entry`) create missing
/// ancestors and are not logged. Handles returned by `open` share the
/// adapter's log, so their reads, writes and closes are recorded too.
#[derive(Debug)]
pub struct MemoryAdapter {
    separator: char,
    state: Rc<RefCell<State>>,
}

impl MemoryAdapter {
    /// Create an adapter holding only the root directory
    #[must_use]
    pub fn new() -> Self {
        Self::with_separator('/')
    }

    /// Create an adapter whose paths use `separator`
    #[must_use]
    pub fn with_separator(separator: char) -> Self {
        let mut state = State::default();
        state.entries.insert(
            separator.to_string(),
            MemEntry::new(EntryType::Directory, 0o755),
        );
        Self {
            separator,
            state: Rc::new(RefCell::new(state)),
        }
    }

    // ========================================================================
    // Fixtures and inspection (not logged)
    // ========================================================================

    /// Add a directory, creating missing ancestors
    pub fn add_dir(&self, path: &str) {
        self.add_entry(path, EntryType::Directory);
    }

    /// Add a regular file with `content`, creating missing ancestors
    pub fn add_file(&self, path: &str, content: &[u8]) {
        self.add_entry(path, EntryType::File);
        if let Some(entry) = self.state.borrow().entries.get(path) {
            *entry.content.borrow_mut() = content.to_vec();
        }
    }

    /// Add an entry of any type, creating missing ancestors as directories
    pub fn add_entry(&self, path: &str, entry_type: EntryType) {
        let mut ancestors = Vec::new();
        let mut current = self.parent_of(path);
        while let Some(ancestor) = current {
            current = self.parent_of(&ancestor);
            ancestors.push(ancestor);
        }

        let mut state = self.state.borrow_mut();
        for ancestor in ancestors.into_iter().rev() {
            state
                .entries
                .entry(ancestor)
                .or_insert_with(|| MemEntry::new(EntryType::Directory, 0o755));
        }
        let mode = if entry_type == EntryType::Directory {
            0o755
        } else {
            0o644
        };
        state
            .entries
            .insert(path.to_string(), MemEntry::new(entry_type, mode));
    }

    /// Whether any entry exists at `path`
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.state.borrow().entries.contains_key(path)
    }

    /// Content of the file at `path`
    #[must_use]
    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .entries
            .get(path)
            .filter(|entry| !entry.is_dir())
            .map(|entry| entry.content.borrow().clone())
    }

    /// Permission bits of the entry at `path`
    #[must_use]
    pub fn mode(&self, path: &str) -> Option<u32> {
        self.state.borrow().entries.get(path).map(|entry| entry.mode)
    }

    /// Owner `(uid, gid)` of the entry at `path`
    #[must_use]
    pub fn owner(&self, path: &str) -> Option<(u32, u32)> {
        self.state
            .borrow()
            .entries
            .get(path)
            .map(|entry| (entry.uid, entry.gid))
    }

    /// All paths currently present, sorted
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.state.borrow().entries.keys().cloned().collect()
    }

    /// Snapshot of the operation log
    #[must_use]
    pub fn operations(&self) -> Vec<Operation> {
        self.state.borrow().log.clone()
    }

    /// Logged paths of one primitive, in invocation order
    #[must_use]
    pub fn operations_of(&self, kind: OpKind) -> Vec<String> {
        self.state
            .borrow()
            .log
            .iter()
            .filter(|op| op.kind == kind)
            .map(|op| op.path.clone())
            .collect()
    }

    /// Clear the operation log
    pub fn clear_operations(&self) {
        self.state.borrow_mut().log.clear();
    }

    /// Make every `kind` call on `path` fail with `error`
    pub fn fail(&self, kind: OpKind, path: &str, error: io::ErrorKind) {
        self.state
            .borrow_mut()
            .failures
            .push((kind, path.to_string(), error));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        self.state.borrow_mut().failures.clear();
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn parent_of(&self, path: &str) -> Option<String> {
        if path.len() == self.separator.len_utf8() {
            return None;
        }
        match path.rfind(self.separator) {
            Some(0) => Some(self.separator.to_string()),
            Some(index) => Some(path[..index].to_string()),
            None => None,
        }
    }

    fn child_prefix(&self, path: &str) -> String {
        if path.len() == self.separator.len_utf8() {
            path.to_string()
        } else {
            format!("{path}{}", self.separator)
        }
    }

    fn begin(&self, kind: OpKind, path: &str) -> io::Result<()> {
        self.state.borrow_mut().begin(kind, path)
    }

    fn require_parent_dir(&self, state: &State, path: &str) -> io::Result<()> {
        let parent = self.parent_of(path).ok_or_else(|| {
            io::Error::new(io::ErrorKind::PermissionDenied, "the root has no parent")
        })?;
        match state.entries.get(&parent) {
            Some(entry) if entry.is_dir() => Ok(()),
            Some(_) => Err(not_a_directory(&parent)),
            None => Err(not_found(&parent)),
        }
    }

    fn has_children(&self, state: &State, path: &str) -> bool {
        let prefix = self.child_prefix(path);
        state
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .any(|(key, _)| key.len() > prefix.len())
    }

    fn create_entry(&self, path: &str, entry_type: EntryType, mode: u32) -> io::Result<()> {
        let mut state = self.state.borrow_mut();
        if state.entries.contains_key(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{path} already exists"),
            ));
        }
        self.require_parent_dir(&state, path)?;
        state
            .entries
            .insert(path.to_string(), MemEntry::new(entry_type, mode));
        Ok(())
    }
}

impl Default for MemoryAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &str) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{path} does not exist"))
}

fn not_a_directory(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotADirectory,
        format!("{path} is not a directory"),
    )
}

fn is_a_directory(path: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::IsADirectory,
        format!("{path} is a directory"),
    )
}

impl Adapter for MemoryAdapter {
    type File = MemoryFile;

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn stat(&self, path: &str) -> io::Result<Stat> {
        self.begin(OpKind::Stat, path)?;
        let state = self.state.borrow();
        let entry = state.entries.get(path).ok_or_else(|| not_found(path))?;
        let size = if entry.is_dir() {
            0
        } else {
            entry.content.borrow().len() as u64
        };
        Ok(Stat {
            entry_type: entry.entry_type,
            size,
            mode: entry.mode,
            uid: entry.uid,
            gid: entry.gid,
            modified: Some(entry.modified),
        })
    }

    async fn ls(&self, path: &str) -> io::Result<Vec<DirEntry>> {
        self.begin(OpKind::Ls, path)?;
        let state = self.state.borrow();
        match state.entries.get(path) {
            Some(entry) if entry.is_dir() => {}
            Some(_) => return Err(not_a_directory(path)),
            None => return Err(not_found(path)),
        }

        let prefix = self.child_prefix(path);
        Ok(state
            .entries
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, entry)| {
                let name = &key[prefix.len()..];
                (!name.is_empty() && !name.contains(self.separator))
                    .then(|| DirEntry::new(name, entry.entry_type))
            })
            .collect())
    }

    async fn mkdir(&self, path: &str, mode: u32) -> io::Result<()> {
        self.begin(OpKind::Mkdir, path)?;
        self.create_entry(path, EntryType::Directory, mode)
    }

    async fn rmdir(&self, path: &str) -> io::Result<()> {
        self.begin(OpKind::Rmdir, path)?;
        let mut state = self.state.borrow_mut();
        match state.entries.get(path) {
            Some(entry) if entry.is_dir() => {}
            Some(_) => return Err(not_a_directory(path)),
            None => return Err(not_found(path)),
        }
        if self.parent_of(path).is_none() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "cannot remove the root",
            ));
        }
        if self.has_children(&state, path) {
            return Err(io::Error::new(
                io::ErrorKind::DirectoryNotEmpty,
                format!("{path} is not empty"),
            ));
        }
        state.entries.remove(path);
        Ok(())
    }

    async fn unlink(&self, path: &str) -> io::Result<()> {
        self.begin(OpKind::Unlink, path)?;
        let mut state = self.state.borrow_mut();
        match state.entries.get(path) {
            Some(entry) if entry.is_dir() => Err(is_a_directory(path)),
            Some(_) => {
                state.entries.remove(path);
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    async fn chmod(&self, path: &str, mode: u32) -> io::Result<()> {
        self.begin(OpKind::Chmod, path)?;
        let mut state = self.state.borrow_mut();
        let entry = state.entries.get_mut(path).ok_or_else(|| not_found(path))?;
        entry.mode = mode & 0o7777;
        Ok(())
    }

    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
        self.begin(OpKind::Chown, path)?;
        let mut state = self.state.borrow_mut();
        let entry = state.entries.get_mut(path).ok_or_else(|| not_found(path))?;
        if let Some(uid) = uid {
            entry.uid = uid;
        }
        if let Some(gid) = gid {
            entry.gid = gid;
        }
        Ok(())
    }

    async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        self.begin(OpKind::Rename, from)?;
        let mut state = self.state.borrow_mut();
        let source_is_dir = match state.entries.get(from) {
            Some(entry) => entry.is_dir(),
            None => return Err(not_found(from)),
        };
        if from == to {
            return Ok(());
        }
        self.require_parent_dir(&state, to)?;
        if to.starts_with(&self.child_prefix(from)) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot move {from} into itself"),
            ));
        }
        if let Some(existing) = state.entries.get(to) {
            match (source_is_dir, existing.is_dir()) {
                (true, true) if self.has_children(&state, to) => {
                    return Err(io::Error::new(
                        io::ErrorKind::DirectoryNotEmpty,
                        format!("{to} is not empty"),
                    ));
                }
                (true, false) => return Err(not_a_directory(to)),
                (false, true) => return Err(is_a_directory(to)),
                _ => {}
            }
        }

        let prefix = self.child_prefix(from);
        let moved: Vec<String> = state
            .entries
            .keys()
            .filter(|key| key.as_str() == from || key.starts_with(&prefix))
            .cloned()
            .collect();
        for old in moved {
            if let Some(entry) = state.entries.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                state.entries.insert(new, entry);
            }
        }
        Ok(())
    }

    async fn touch(&self, path: &str, mode: u32) -> io::Result<()> {
        self.begin(OpKind::Touch, path)?;
        if let Some(entry) = self.state.borrow_mut().entries.get_mut(path) {
            entry.modified = SystemTime::now();
            return Ok(());
        }
        self.create_entry(path, EntryType::File, mode)
    }

    async fn open(&self, path: &str, flags: OpenFlags) -> io::Result<MemoryFile> {
        self.begin(OpKind::Open, path)?;
        let exists = self.state.borrow().entries.contains_key(path);
        if !exists {
            if !flags.create {
                return Err(not_found(path));
            }
            self.create_entry(path, EntryType::File, 0o644)?;
        }

        let state = self.state.borrow();
        let entry = state.entries.get(path).ok_or_else(|| not_found(path))?;
        if entry.is_dir() {
            return Err(is_a_directory(path));
        }
        if flags.truncate && flags.write {
            entry.content.borrow_mut().clear();
        }
        Ok(MemoryFile {
            state: Rc::clone(&self.state),
            path: path.to_string(),
            content: Rc::clone(&entry.content),
            readable: flags.read,
            writable: flags.write,
        })
    }
}

/// Handle onto the content of an in-memory file
#[derive(Debug)]
pub struct MemoryFile {
    state: Rc<RefCell<State>>,
    path: String,
    content: Rc<RefCell<Vec<u8>>>,
    readable: bool,
    writable: bool,
}

impl AdapterFile for MemoryFile {
    async fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.state.borrow_mut().begin(OpKind::Read, &self.path)?;
        if !self.readable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "handle not opened for reading",
            ));
        }
        let content = self.content.borrow();
        let start = usize::try_from(offset).unwrap_or(usize::MAX).min(content.len());
        let end = start.saturating_add(len).min(content.len());
        Ok(content[start..end].to_vec())
    }

    async fn write_at(&mut self, data: Vec<u8>, offset: u64) -> io::Result<usize> {
        self.state.borrow_mut().begin(OpKind::Write, &self.path)?;
        if !self.writable {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "handle not opened for writing",
            ));
        }
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset too large"))?;
        let mut content = self.content.borrow_mut();
        if content.len() < start + data.len() {
            content.resize(start + data.len(), 0);
        }
        content[start..start + data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    async fn close(self) -> io::Result<()> {
        self.state.borrow_mut().begin(OpKind::Close, &self.path)
    }
}
