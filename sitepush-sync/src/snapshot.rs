//! Snapshotter: content hashes for every regular file under a root.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use sitepush_core::{config::HashConfig, records, Snapshot, VersionLabel};

use crate::error::{io_err, SyncError};
use crate::revision;

/// SHA-256 of the file's raw bytes as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String, SyncError> {
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| io_err(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash every regular file below `root`.
///
/// Keys are root-relative and `/`-separated. Symlinks are followed. A file
/// whose key equals `exclude` is skipped. Any walk or read error aborts the
/// whole snapshot.
pub fn snapshot_tree(
    root: &Path,
    version: VersionLabel,
    exclude: Option<&str>,
) -> Result<Snapshot, SyncError> {
    let mut snapshot = Snapshot::new(version);

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| SyncError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(key) = relative_key(root, entry.path())? else {
            continue;
        };
        if exclude == Some(key.as_str()) {
            tracing::debug!("skipping snapshot output {key}");
            continue;
        }

        let hash = hash_file(entry.path())?;
        tracing::debug!("{key} - {hash}");
        snapshot.entries.insert(key, hash);
    }

    Ok(snapshot)
}

/// Produce and persist the snapshot described by `config`.
///
/// The version label is the explicit one if given, otherwise the short VCS
/// revision of the working directory.
pub fn create_snapshot(config: &HashConfig) -> Result<Snapshot, SyncError> {
    tracing::info!(
        "Create hash file: {} for the directory: {}",
        config.output_file.display(),
        config.directory.display()
    );

    let version = revision::resolve_version(config.version_label.as_deref(), Path::new("."))?;
    let exclude = output_key(&config.directory, &config.output_file);
    let snapshot = snapshot_tree(&config.directory, version, exclude.as_deref())?;

    records::save_snapshot(&config.output_file, &snapshot)?;
    tracing::info!("Hashed {} files ({})", snapshot.len(), snapshot.version);
    Ok(snapshot)
}

/// `/`-joined path of `path` below `root`, or `None` when it is not below it.
///
/// A name that is not valid UTF-8 is an error.
fn relative_key(root: &Path, path: &Path) -> Result<Option<String>, SyncError> {
    let Ok(relative) = path.strip_prefix(root) else {
        return Ok(None);
    };
    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part.to_str().ok_or_else(|| SyncError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
            segments.push(part);
        }
    }
    if segments.is_empty() {
        Ok(None)
    } else {
        Ok(Some(segments.join("/")))
    }
}

/// Key the output file would get if it lies inside the hashed tree.
fn output_key(root: &Path, output: &Path) -> Option<String> {
    let root = absolute(root);
    let output = match output.parent() {
        // The file itself may not exist yet; resolve its directory.
        Some(parent) if !parent.as_os_str().is_empty() => {
            absolute(parent).join(output.file_name()?)
        }
        _ => absolute(Path::new(".")).join(output.file_name()?),
    };
    relative_key(&root, &output).ok().flatten()
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("img")).unwrap();
        fs::create_dir_all(root.join("blog/2024")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("index.html"), "<h1>home</h1>").unwrap();
        fs::write(root.join("img/logo.png"), [0x89, b'P', b'N', b'G']).unwrap();
        fs::write(root.join("blog/2024/post.html"), "post").unwrap();
        tmp
    }

    #[test]
    fn hash_file_is_sha256_hex() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("abc.txt");
        fs::write(&path, "abc").unwrap();
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn records_regular_files_with_relative_slash_keys() {
        let tmp = site();
        let snapshot = snapshot_tree(tmp.path(), VersionLabel::from("v1"), None).unwrap();

        let keys: Vec<&str> = snapshot.entries.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["blog/2024/post.html", "img/logo.png", "index.html"]);
        assert_eq!(snapshot.version, VersionLabel::from("v1"));
        assert!(snapshot.entries.values().all(|h| h.len() == 64));
    }

    #[test]
    fn hashing_same_tree_twice_is_identical() {
        let tmp = site();
        let first = snapshot_tree(tmp.path(), VersionLabel::from("v"), None).unwrap();
        let second = snapshot_tree(tmp.path(), VersionLabel::from("v"), None).unwrap();
        assert_eq!(first.entries, second.entries);
    }

    #[test]
    fn content_change_changes_only_that_hash() {
        let tmp = site();
        let before = snapshot_tree(tmp.path(), VersionLabel::default(), None).unwrap();
        fs::write(tmp.path().join("index.html"), "<h1>changed</h1>").unwrap();
        let after = snapshot_tree(tmp.path(), VersionLabel::default(), None).unwrap();

        assert_ne!(before.entries["index.html"], after.entries["index.html"]);
        assert_eq!(before.entries["img/logo.png"], after.entries["img/logo.png"]);
    }

    #[test]
    fn excluded_key_is_skipped() {
        let tmp = site();
        fs::write(tmp.path().join("latest.hash"), "version: old\n").unwrap();
        let snapshot =
            snapshot_tree(tmp.path(), VersionLabel::default(), Some("latest.hash")).unwrap();
        assert!(!snapshot.entries.contains_key("latest.hash"));
        assert_eq!(snapshot.len(), 3);
    }

    #[test]
    fn missing_root_is_a_walk_error() {
        let tmp = TempDir::new().unwrap();
        let err = snapshot_tree(&tmp.path().join("absent"), VersionLabel::default(), None)
            .unwrap_err();
        assert!(matches!(err, SyncError::Walk { .. }), "got: {err}");
    }

    #[test]
    fn create_snapshot_writes_record_without_hashing_itself() {
        let tmp = site();
        let output = tmp.path().join("latest.hash");
        fs::write(&output, "version: previous\ndata: {}\n").unwrap();

        let config = HashConfig {
            directory: tmp.path().to_path_buf(),
            output_file: output.clone(),
            version_label: Some("abc1234".to_string()),
        };
        let snapshot = create_snapshot(&config).unwrap();
        assert_eq!(snapshot.len(), 3);

        let persisted = records::load_snapshot(&output).unwrap();
        assert_eq!(persisted, snapshot);
        assert_eq!(persisted.version, VersionLabel::from("abc1234"));
    }

    #[test]
    fn output_key_is_none_outside_root() {
        let site = site();
        let elsewhere = TempDir::new().unwrap();
        assert_eq!(
            output_key(site.path(), &elsewhere.path().join("latest.hash")),
            None
        );
        assert_eq!(
            output_key(site.path(), &site.path().join("img/latest.hash")),
            Some("img/latest.hash".to_string())
        );
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_are_rejected_instead_of_merged() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let tmp = TempDir::new().unwrap();
        let first = tmp.path().join(OsStr::from_bytes(b"a\xff.html"));
        let second = tmp.path().join(OsStr::from_bytes(b"a\xfe.html"));
        fs::write(&first, "one").unwrap();
        fs::write(&second, "two").unwrap();

        let err = snapshot_tree(tmp.path(), VersionLabel::from("v1"), None).unwrap_err();
        match err {
            SyncError::NonUtf8Path { path } => assert!(path == first || path == second),
            other => panic!("unexpected error: {other}"),
        }
    }
}
