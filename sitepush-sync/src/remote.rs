//! Remote-store capability and the non-network implementations.
//!
//! A [`RemoteStore`] is one exclusively owned session against the publish
//! target. Paths handed to it are `/`-separated; relative paths resolve
//! against the session's current directory, as on an FTP control connection.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

/// Failure reported by a remote store.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// FTP reply or transport failure.
    #[error("ftp: {0}")]
    Ftp(#[from] suppaftp::FtpError),

    /// The host name resolved to no usable address.
    #[error("cannot resolve {0}")]
    Resolve(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    /// The store refused the operation (missing path, collision, closed session).
    #[error("{0}")]
    Rejected(String),
}

/// Operations the deploy engine needs from a publish target.
pub trait RemoteStore {
    /// Make `path` the current directory. Fails if it does not exist.
    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Create a single directory. Fails if it already exists.
    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Create or overwrite the file at `path` with `bytes`.
    fn store(&mut self, path: &str, bytes: &[u8]) -> Result<(), RemoteError>;

    /// Remove the file at `path`.
    fn delete(&mut self, path: &str) -> Result<(), RemoteError>;

    /// Read the whole file at `path`.
    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, RemoteError>;

    /// End the session.
    fn close(&mut self) -> Result<(), RemoteError>;

    /// Walk `path` one segment at a time, creating segments that cannot be
    /// entered, then return to `root`.
    ///
    /// Navigation failure is the existence test, so re-running is harmless
    /// per segment. A failure partway leaves the already created segments.
    fn ensure_directory(&mut self, path: &str, root: &str) -> Result<(), RemoteError> {
        tracing::debug!("create the directory {path}");
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if self.change_dir(segment).is_err() {
                self.make_dir(segment)?;
                self.change_dir(segment)?;
            }
        }
        self.change_dir(root)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// One call received by a [`MemoryStore`], with its argument as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    ChangeDir(String),
    MakeDir(String),
    Store(String),
    Delete(String),
    Retrieve(String),
    Close,
}

/// In-memory remote tree with FTP-like semantics and a call journal.
///
/// Directories must exist before files are stored in them, `make_dir`
/// refuses existing paths, and `delete` refuses absent files.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cwd: Vec<String>,
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
    calls: Vec<RemoteCall>,
    fail_on: Option<RemoteCall>,
    closed: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a directory (and its ancestors). `path` is relative to `/`.
    pub fn with_dir(mut self, path: &str) -> Self {
        let mut prefix = Vec::new();
        for segment in split(path) {
            prefix.push(segment.to_string());
            self.dirs.insert(prefix.join("/"));
        }
        self
    }

    /// Seed a file, creating its parent directories.
    pub fn with_file(self, path: &str, bytes: &[u8]) -> Self {
        let key = split(path).collect::<Vec<_>>().join("/");
        let mut store = match key.rsplit_once('/') {
            Some((parent, _)) => self.with_dir(parent),
            None => self,
        };
        store.files.insert(key, bytes.to_vec());
        store
    }

    /// Reject the first call equal to `call`.
    pub fn fail_on(mut self, call: RemoteCall) -> Self {
        self.fail_on = Some(call);
        self
    }

    /// Contents of a file, by path relative to `/`.
    pub fn file(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path.trim_start_matches('/')).map(Vec::as_slice)
    }

    /// True if the directory exists, by path relative to `/`.
    pub fn has_dir(&self, path: &str) -> bool {
        let key = path.trim_matches('/');
        key.is_empty() || self.dirs.contains(key)
    }

    /// Every file path currently stored, relative to `/`.
    pub fn file_paths(&self) -> Vec<&str> {
        self.files.keys().map(String::as_str).collect()
    }

    /// Start a fresh session against the same tree.
    pub fn reopen(&mut self) {
        self.closed = false;
        self.cwd.clear();
    }

    pub fn calls(&self) -> &[RemoteCall] {
        &self.calls
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn record(&mut self, call: RemoteCall) -> Result<(), RemoteError> {
        if self.closed {
            return Err(RemoteError::Rejected("session closed".to_string()));
        }
        let injected = self.fail_on.as_ref() == Some(&call);
        self.calls.push(call);
        if injected {
            self.fail_on = None;
            return Err(RemoteError::Rejected("injected failure".to_string()));
        }
        Ok(())
    }

    /// Resolve against the current directory into a key relative to `/`.
    fn resolve(&self, path: &str) -> String {
        let mut parts = if path.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.clone()
        };
        for segment in split(path) {
            match segment {
                "." => {}
                ".." => {
                    parts.pop();
                }
                other => parts.push(other.to_string()),
            }
        }
        parts.join("/")
    }

    fn parent_exists(&self, key: &str) -> bool {
        match key.rsplit_once('/') {
            Some((parent, _)) => self.dirs.contains(parent),
            None => true,
        }
    }
}

impl RemoteStore for MemoryStore {
    fn change_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::ChangeDir(path.to_string()))?;
        let key = self.resolve(path);
        if !key.is_empty() && !self.dirs.contains(&key) {
            return Err(RemoteError::Rejected(format!("550 /{key}: no such directory")));
        }
        self.cwd = split(&key).map(str::to_string).collect();
        Ok(())
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::MakeDir(path.to_string()))?;
        let key = self.resolve(path);
        if key.is_empty() || self.dirs.contains(&key) || self.files.contains_key(&key) {
            return Err(RemoteError::Rejected(format!("550 /{key}: already exists")));
        }
        if !self.parent_exists(&key) {
            return Err(RemoteError::Rejected(format!("550 /{key}: parent missing")));
        }
        self.dirs.insert(key);
        Ok(())
    }

    fn store(&mut self, path: &str, bytes: &[u8]) -> Result<(), RemoteError> {
        self.record(RemoteCall::Store(path.to_string()))?;
        let key = self.resolve(path);
        if key.is_empty() || self.dirs.contains(&key) {
            return Err(RemoteError::Rejected(format!("553 /{key}: is a directory")));
        }
        if !self.parent_exists(&key) {
            return Err(RemoteError::Rejected(format!("553 /{key}: parent missing")));
        }
        self.files.insert(key, bytes.to_vec());
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.record(RemoteCall::Delete(path.to_string()))?;
        let key = self.resolve(path);
        match self.files.remove(&key) {
            Some(_) => Ok(()),
            None => Err(RemoteError::Rejected(format!("550 /{key}: no such file"))),
        }
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.record(RemoteCall::Retrieve(path.to_string()))?;
        let key = self.resolve(path);
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| RemoteError::Rejected(format!("550 /{key}: no such file")))
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        self.record(RemoteCall::Close)?;
        self.closed = true;
        Ok(())
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

// ---------------------------------------------------------------------------
// DryRunStore
// ---------------------------------------------------------------------------

/// Accepts every mutation and only logs it. Backs `deploy --dry-run`.
#[derive(Debug, Default)]
pub struct DryRunStore {
    operations: usize,
}

impl DryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutations that would have been sent.
    pub fn operations(&self) -> usize {
        self.operations
    }
}

impl RemoteStore for DryRunStore {
    fn change_dir(&mut self, _path: &str) -> Result<(), RemoteError> {
        Ok(())
    }

    fn make_dir(&mut self, path: &str) -> Result<(), RemoteError> {
        self.operations += 1;
        tracing::info!("[dry-run] would create directory: {path}");
        Ok(())
    }

    fn store(&mut self, path: &str, bytes: &[u8]) -> Result<(), RemoteError> {
        self.operations += 1;
        tracing::info!("[dry-run] would upload: {path} ({} bytes)", bytes.len());
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.operations += 1;
        tracing::info!("[dry-run] would delete: {path}");
        Ok(())
    }

    fn retrieve(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::Rejected(format!(
            "dry-run session cannot download {path}"
        )))
    }

    fn close(&mut self) -> Result<(), RemoteError> {
        Ok(())
    }

    fn ensure_directory(&mut self, path: &str, _root: &str) -> Result<(), RemoteError> {
        self.make_dir(path)
    }
}
