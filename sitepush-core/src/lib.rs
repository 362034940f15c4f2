//! sitepush core library — record types, persistence, configuration, errors.
//!
//! Public API surface:
//! - [`types`] — `Snapshot`, `Changeset` and supporting newtypes
//! - [`error`] — [`RecordError`], [`ConfigError`]
//! - [`records`] — load / save with atomic writes
//! - [`config`] — config file discovery and resolved per-command settings

pub mod config;
pub mod error;
pub mod records;
pub mod types;

pub use error::{ConfigError, RecordError};
pub use types::{Changeset, FoldStrategy, Snapshot, VersionLabel};
