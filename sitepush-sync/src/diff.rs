//! Differ: derive a [`Changeset`] from two snapshots.
//!
//! Classification:
//! 1. path only in new            -> `add`
//! 2. path in both, hash differs  -> `update`
//! 3. path only in old            -> `delete`
//!
//! Directory inference runs over the parents of added paths only. The parent
//! set is folded so each branch keeps its deepest directory (creating it
//! creates its ancestors), then directories the old snapshot already implies
//! are dropped. `after` always holds the new snapshot's own file name.

use std::collections::BTreeSet;
use std::path::Path;

use sitepush_core::{config::DiffConfig, records, Changeset, FoldStrategy, Snapshot};

use crate::SyncError;

/// Compare `old` against `new`.
///
/// `bookkeeping_file` is the name the new snapshot is published under; it is
/// uploaded after every other phase.
pub fn diff_snapshots(
    old: &Snapshot,
    new: &Snapshot,
    bookkeeping_file: &str,
    fold: FoldStrategy,
) -> Changeset {
    let mut changeset = Changeset {
        old_version: old.version.clone(),
        new_version: new.version.clone(),
        ..Changeset::default()
    };

    for (path, hash) in &new.entries {
        match old.entries.get(path) {
            None => changeset.add.push(path.clone()),
            Some(previous) if previous != hash => changeset.update.push(path.clone()),
            Some(_) => {}
        }
    }

    for path in old.entries.keys() {
        if !new.entries.contains_key(path) {
            changeset.delete.push(path.clone());
        }
    }

    let required = changeset
        .add
        .iter()
        .filter_map(|path| parent_dir(path))
        .map(str::to_string);
    let existing: Vec<&str> = old.entries.keys().filter_map(|p| parent_dir(p)).collect();
    changeset.directories = fold_directories(required, fold)
        .into_iter()
        .filter(|dir| !directory_exists(dir, &existing, fold))
        .collect();

    changeset.after.push(bookkeeping_file.to_string());
    changeset
}

/// Everything before the last `/`, or `None` for a top-level path.
pub fn parent_dir(path: &str) -> Option<&str> {
    path.rsplit_once('/')
        .map(|(parent, _)| parent)
        .filter(|parent| !parent.is_empty())
}

/// Collapse `dirs` so no kept entry is an ancestor of another.
pub fn fold_directories<I>(dirs: I, strategy: FoldStrategy) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    match strategy {
        FoldStrategy::Canonical => fold_canonical(dirs),
        FoldStrategy::Legacy => fold_legacy(dirs),
    }
}

/// Sorted minimal covering set: drop every directory that has a strict
/// descendant in the set. Independent of input order.
fn fold_canonical<I>(dirs: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let set: BTreeSet<String> = dirs.into_iter().collect();
    set.iter()
        .filter(|dir| !has_descendant(&set, dir))
        .cloned()
        .collect()
}

/// Encounter-order fold with raw string prefixes, seeded with the first
/// directory. `a/b` counts as an ancestor of `a/bc` here.
///
/// Each directory is checked against the kept entries in order and the
/// first related entry decides: an entry that already extends it absorbs it,
/// an entry it extends is replaced in place. Unrelated directories are
/// appended.
fn fold_legacy<I>(dirs: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut dirs = dirs.into_iter();
    let Some(first) = dirs.next() else {
        return Vec::new();
    };

    let mut kept = vec![first.clone()];
    for dir in std::iter::once(first).chain(dirs) {
        let related = kept
            .iter()
            .position(|k| k.starts_with(dir.as_str()) || dir.starts_with(k.as_str()));
        match related {
            Some(i) if kept[i].starts_with(dir.as_str()) => {}
            Some(i) => kept[i] = dir,
            None => kept.push(dir),
        }
    }
    kept
}

/// Whether the old snapshot's parent directories already contain `dir`.
fn directory_exists(dir: &str, existing: &[&str], fold: FoldStrategy) -> bool {
    match fold {
        FoldStrategy::Canonical => existing.iter().any(|e| is_same_or_below(e, dir)),
        FoldStrategy::Legacy => existing.iter().any(|e| e.starts_with(dir)),
    }
}

fn has_descendant(set: &BTreeSet<String>, dir: &str) -> bool {
    let prefix = format!("{dir}/");
    set.range(prefix.clone()..)
        .next()
        .is_some_and(|candidate| candidate.starts_with(&prefix))
}

/// `path == dir` or `path` lies below `dir`, on segment boundaries.
fn is_same_or_below(path: &str, dir: &str) -> bool {
    path.strip_prefix(dir)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Log one line per category, as operators expect after a diff.
pub fn log_counts(changeset: &Changeset) {
    tracing::info!("Dir    {}", changeset.directories.len());
    tracing::info!("Add    {}", changeset.add.len());
    tracing::info!("Update {}", changeset.update.len());
    tracing::info!("Delete {}", changeset.delete.len());
    tracing::info!("After  {}", changeset.after.len());
}

/// Load both snapshots, diff them, and persist the changeset.
///
/// Either snapshot failing to load aborts before any diffing.
pub fn diff_files(config: &DiffConfig) -> Result<Changeset, SyncError> {
    tracing::info!(
        "Diff {} <-> {} output {}",
        config.old_snapshot.display(),
        config.new_snapshot.display(),
        config.output_file.display()
    );

    let old = records::load_snapshot(&config.old_snapshot)?;
    let new = records::load_snapshot(&config.new_snapshot)?;

    let bookkeeping = bookkeeping_name(&config.new_snapshot);
    let changeset = diff_snapshots(&old, &new, &bookkeeping, config.fold);
    log_counts(&changeset);

    records::save_changeset(&config.output_file, &changeset)?;
    Ok(changeset)
}

/// File name component of the new snapshot's path.
pub fn bookkeeping_name(new_snapshot: &Path) -> String {
    new_snapshot
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| new_snapshot.to_string_lossy().into_owned())
}
