//! # sitepush-sync
//!
//! Snapshotting, diffing and remote replay for a static site.
//!
//! The usual cycle is [`create_snapshot`] for the freshly built tree,
//! [`diff_files`] against the snapshot last published, then [`deploy`] of
//! the resulting changeset.

pub mod apply;
pub mod diff;
pub mod error;
pub mod ftp;
pub mod pipeline;
pub mod remote;
pub mod revision;
pub mod snapshot;

pub use apply::{apply_changeset, AppliedStep, ApplyReport, Phase};
pub use diff::{diff_files, diff_snapshots, fold_directories};
pub use error::SyncError;
pub use ftp::FtpStore;
pub use pipeline::{deploy, deploy_with, download_latest, fetch_latest, Destination};
pub use remote::{DryRunStore, MemoryStore, RemoteCall, RemoteError, RemoteStore};
pub use snapshot::{create_snapshot, hash_file, snapshot_tree};
