//! Applier: replay a changeset against a remote store.
//!
//! ## Phase order
//!
//! 1. `MKDIR`  every directory in `directories`
//! 2. `ADD`    every path in `add`
//! 3. `UPDATE` every path in `update`
//! 4. `DELETE` every path in `delete`
//! 5. `AFTER`  every path in `after` (the bookkeeping snapshot)
//!
//! Each step logs `[<total>/<index>] <PHASE> <path>` with a 1-based index.
//! The first failing step aborts the run. Nothing is rolled back, and the
//! bookkeeping file is never uploaded after a failure, so the next diff
//! still starts from the last fully deployed snapshot.

use std::fmt;
use std::fs;
use std::path::Path;

use sitepush_core::Changeset;

use crate::error::SyncError;
use crate::remote::{RemoteError, RemoteStore};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// One of the five replay phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    MakeDir,
    Add,
    Update,
    Delete,
    After,
}

impl Phase {
    /// Upper-case label used in progress lines and errors.
    pub fn label(self) -> &'static str {
        match self {
            Phase::MakeDir => "MKDIR",
            Phase::Add => "ADD",
            Phase::Update => "UPDATE",
            Phase::Delete => "DELETE",
            Phase::After => "AFTER",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// A step that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedStep {
    pub phase: Phase,
    pub path: String,
}

/// Outcome of a successful replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Steps the changeset declared.
    pub total: usize,
    /// Completed steps in execution order.
    pub steps: Vec<AppliedStep>,
}

impl ApplyReport {
    /// Completed steps of one phase.
    pub fn count(&self, phase: Phase) -> usize {
        self.steps.iter().filter(|s| s.phase == phase).count()
    }
}

// ---------------------------------------------------------------------------
// apply_changeset
// ---------------------------------------------------------------------------

/// Replay `changeset` against `store`.
///
/// `source_dir` is the local tree uploaded bytes are read from; changeset
/// paths are joined onto it verbatim. `remote_root` is entered before the
/// first step and is where directory creation returns to, so every
/// changeset path resolves relative to it.
pub fn apply_changeset<S>(
    changeset: &Changeset,
    source_dir: &Path,
    remote_root: &str,
    store: &mut S,
) -> Result<ApplyReport, SyncError>
where
    S: RemoteStore + ?Sized,
{
    let mut report = ApplyReport {
        total: changeset.step_count(),
        steps: Vec::with_capacity(changeset.step_count()),
    };
    tracing::info!("[{}/0]", report.total);

    store
        .change_dir(remote_root)
        .map_err(|source| SyncError::RemoteRoot {
            path: remote_root.to_string(),
            source,
        })?;

    for dir in &changeset.directories {
        step(&mut report, Phase::MakeDir, dir, store, |s, path| {
            s.ensure_directory(path, remote_root)
        })?;
    }

    for (phase, paths) in [
        (Phase::Add, &changeset.add),
        (Phase::Update, &changeset.update),
    ] {
        for path in paths {
            upload(&mut report, phase, path, source_dir, store)?;
        }
    }

    for path in &changeset.delete {
        step(&mut report, Phase::Delete, path, store, |s, path| s.delete(path))?;
    }

    for path in &changeset.after {
        upload(&mut report, Phase::After, path, source_dir, store)?;
    }

    Ok(report)
}

fn upload<S>(
    report: &mut ApplyReport,
    phase: Phase,
    path: &str,
    source_dir: &Path,
    store: &mut S,
) -> Result<(), SyncError>
where
    S: RemoteStore + ?Sized,
{
    announce(report, phase, path);
    let local = source_dir.join(path);
    let bytes = fs::read(&local).map_err(|source| SyncError::LocalRead {
        phase,
        path: local.clone(),
        source,
    })?;
    store.store(path, &bytes).map_err(|source| SyncError::Remote {
        phase,
        path: path.to_string(),
        source,
    })?;
    record(report, phase, path);
    Ok(())
}

fn step<S, F>(
    report: &mut ApplyReport,
    phase: Phase,
    path: &str,
    store: &mut S,
    op: F,
) -> Result<(), SyncError>
where
    S: RemoteStore + ?Sized,
    F: FnOnce(&mut S, &str) -> Result<(), RemoteError>,
{
    announce(report, phase, path);
    op(store, path).map_err(|source| SyncError::Remote {
        phase,
        path: path.to_string(),
        source,
    })?;
    record(report, phase, path);
    Ok(())
}

fn announce(report: &ApplyReport, phase: Phase, path: &str) {
    tracing::info!(
        "[{}/{}] {:<6} {}",
        report.total,
        report.steps.len() + 1,
        phase,
        path
    );
}

fn record(report: &mut ApplyReport, phase: Phase, path: &str) {
    report.steps.push(AppliedStep {
        phase,
        path: path.to_string(),
    });
}
