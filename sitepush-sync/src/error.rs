//! Error types for sitepush-sync.

use std::path::PathBuf;

use thiserror::Error;

use sitepush_core::RecordError;

use crate::apply::Phase;
use crate::remote::RemoteError;

/// All errors that can arise while snapshotting, diffing or deploying.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A snapshot or changeset record could not be read or written.
    #[error("record error: {0}")]
    Record(#[from] RecordError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file below the snapshot root has a name that is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    /// Directory traversal failed below `root`.
    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The remote host could not be reached.
    #[error("cannot connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: RemoteError,
    },

    /// The remote host refused the credentials.
    #[error("login as '{username}' failed: {source}")]
    Login {
        username: String,
        #[source]
        source: RemoteError,
    },

    /// The remote root directory could not be entered.
    #[error("cannot enter remote root {path}: {source}")]
    RemoteRoot {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// A local file named by the changeset could not be read for upload.
    #[error("{phase} {}: cannot read local file: {source}", path.display())]
    LocalRead {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote operation failed while replaying a changeset.
    #[error("{phase} {path} failed: {source}")]
    Remote {
        phase: Phase,
        path: String,
        #[source]
        source: RemoteError,
    },

    /// Fetching a remote file failed.
    #[error("download of {path} failed: {source}")]
    Download {
        path: String,
        #[source]
        source: RemoteError,
    },

    /// The remote session did not end cleanly.
    #[error("closing remote session failed: {0}")]
    Close(#[source] RemoteError),

    /// The version label could not be derived from the VCS.
    #[error("revision lookup failed: {0}")]
    Revision(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
