//! YAML persistence for snapshot and changeset records.
//!
//! # Storage layout
//!
//! ```text
//! public/
//!   latest.hash     (Snapshot: `version` + `data` path -> digest map)
//! latest.hash       (previous Snapshot, downloaded from the remote)
//! latest.diff       (Changeset: oldVersion/newVersion/dir/add/update/delete/after)
//! ```
//!
//! Writes go to a `.tmp` sibling in the same directory and are renamed into
//! place, so a crashed run never leaves a truncated record behind.

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{io_err, RecordError};
use crate::types::{Changeset, Snapshot};

// ---------------------------------------------------------------------------
// 1. Snapshots
// ---------------------------------------------------------------------------

/// Load a snapshot record.
///
/// Returns `RecordError::NotFound` if absent,
/// `RecordError::Parse` (with path + line context) if malformed YAML.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, RecordError> {
    load_yaml(path)
}

/// Atomically save a snapshot record, creating parent directories.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), RecordError> {
    save_yaml(path, snapshot)
}

// ---------------------------------------------------------------------------
// 2. Changesets
// ---------------------------------------------------------------------------

/// Load a changeset record. A missing `dir` field reads as no directories.
pub fn load_changeset(path: &Path) -> Result<Changeset, RecordError> {
    load_yaml(path)
}

/// Atomically save a changeset record, creating parent directories.
pub fn save_changeset(path: &Path, changeset: &Changeset) -> Result<(), RecordError> {
    save_yaml(path, changeset)
}

// ---------------------------------------------------------------------------
// 3. Raw file writes
// ---------------------------------------------------------------------------

/// Write `bytes` to `path` via `<name>.tmp` + rename.
///
/// Parent directories are created first. The `.tmp` sibling is removed if the
/// rename fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RecordError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| io_err(path, std::io::Error::other("record path has no file name")))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    std::fs::write(&tmp, bytes).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, RecordError> {
    if !path.exists() {
        return Err(RecordError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|e| RecordError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}

fn save_yaml<T: Serialize>(path: &Path, record: &T) -> Result<(), RecordError> {
    let yaml = serde_yaml::to_string(record)?;
    write_atomic(path, yaml.as_bytes())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
