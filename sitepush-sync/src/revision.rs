//! Version labels from the working tree's VCS revision.

use std::path::Path;
use std::process::Command;

use sitepush_core::VersionLabel;

use crate::error::{io_err, SyncError};

/// Length of the abbreviated revision used as a default label.
pub const SHORT_REVISION_LEN: usize = 7;

/// `git rev-parse --short=<len> HEAD` run inside `dir`.
pub fn short_revision(dir: &Path, len: usize) -> Result<VersionLabel, SyncError> {
    let short = format!("--short={len}");
    tracing::debug!("git rev-parse {short} HEAD");
    let output = Command::new("git")
        .args(["rev-parse", short.as_str(), "HEAD"])
        .current_dir(dir)
        .output()
        .map_err(|e| io_err("git", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SyncError::Revision(format!(
            "git rev-parse exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let revision = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
    if revision.is_empty() {
        return Err(SyncError::Revision("git rev-parse printed nothing".to_string()));
    }
    Ok(VersionLabel(revision))
}

/// An explicit label wins; otherwise ask the VCS in `dir`.
pub fn resolve_version(explicit: Option<&str>, dir: &Path) -> Result<VersionLabel, SyncError> {
    match explicit {
        Some(label) => Ok(VersionLabel::from(label)),
        None => short_revision(dir, SHORT_REVISION_LEN),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_label_skips_vcs_lookup() {
        let tmp = TempDir::new().unwrap();
        let label = resolve_version(Some("release-7"), tmp.path()).unwrap();
        assert_eq!(label, VersionLabel::from("release-7"));
    }

    #[test]
    fn lookup_outside_a_repository_fails() {
        let tmp = TempDir::new().unwrap();
        let err = short_revision(&tmp.path().join("missing"), SHORT_REVISION_LEN).unwrap_err();
        assert!(
            matches!(err, SyncError::Io { .. } | SyncError::Revision(_)),
            "got: {err}"
        );
    }
}
