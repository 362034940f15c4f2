//! Roundtrip serialisation tests for `sitepush-core` records.
//!
//! Records are serialised in memory; each `#[case]` is independent.

use rstest::rstest;
use sitepush_core::types::{Changeset, Snapshot, VersionLabel};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn snapshot_of(version: &str, entries: &[(&str, &str)]) -> Snapshot {
    let mut snapshot = Snapshot::new(version);
    for (path, hash) in entries {
        snapshot.entries.insert(path.to_string(), hash.to_string());
    }
    snapshot
}

fn full_changeset() -> Changeset {
    Changeset {
        old_version: VersionLabel::from("1a2b3c4"),
        new_version: VersionLabel::from("5d6e7f8"),
        directories: vec!["blog/2024".to_string(), "css".to_string()],
        add: vec!["blog/2024/post.html".to_string(), "css/site.css".to_string()],
        update: vec!["index.html".to_string()],
        delete: vec!["old/page.html".to_string()],
        after: vec!["latest.hash".to_string()],
    }
}

// ---------------------------------------------------------------------------
// Parameterised roundtrip tests
// ---------------------------------------------------------------------------

#[rstest]
#[case("empty", snapshot_of("", &[]))]
#[case("flat", snapshot_of("a1b2c3d", &[("index.html", "h1"), ("about.html", "h2")]))]
#[case("nested", snapshot_of("a1b2c3d", &[("img/logo.png", "h2"), ("a/b/c/d.txt", "h3")]))]
#[case("unicode_paths", snapshot_of("ünï", &[("blog/日本語.html", "h4"), ("ñ/é.css", "h5")]))]
#[case("numeric_looking", snapshot_of("1234567", &[("1e5", "0123"), ("true", "null")]))]
fn snapshot_roundtrip(#[case] label: &str, #[case] snapshot: Snapshot) {
    let yaml = serde_yaml::to_string(&snapshot)
        .unwrap_or_else(|e| panic!("[{label}] serialize failed: {e}"));
    let back: Snapshot = serde_yaml::from_str(&yaml)
        .unwrap_or_else(|e| panic!("[{label}] deserialize failed: {e}"));
    assert_eq!(snapshot, back, "[{label}]");
}

#[rstest]
#[case("default", Changeset::default())]
#[case("all_fields", full_changeset())]
fn changeset_roundtrip(#[case] label: &str, #[case] changeset: Changeset) {
    let yaml = serde_yaml::to_string(&changeset)
        .unwrap_or_else(|e| panic!("[{label}] serialize failed: {e}"));
    let back: Changeset = serde_yaml::from_str(&yaml)
        .unwrap_or_else(|e| panic!("[{label}] deserialize failed: {e}"));
    assert_eq!(changeset, back, "[{label}]");
}

// ---------------------------------------------------------------------------
// Schema tolerance
// ---------------------------------------------------------------------------

#[rstest]
#[case("no_dir_key", "oldVersion: a\nnewVersion: b\nadd: []\nupdate: []\ndelete: []\nafter: []\n")]
#[case("null_dir", "oldVersion: a\nnewVersion: b\ndir: ~\nadd: []\nupdate: []\ndelete: []\nafter: []\n")]
#[case("only_versions", "oldVersion: a\nnewVersion: b\n")]
fn changeset_without_directories_reads_as_empty(#[case] label: &str, #[case] yaml: &str) {
    let changeset: Changeset = serde_yaml::from_str(yaml)
        .unwrap_or_else(|e| panic!("[{label}] deserialize failed: {e}"));
    assert!(changeset.directories.is_empty(), "[{label}]");
    assert_eq!(changeset.old_version, VersionLabel::from("a"), "[{label}]");
    assert_eq!(changeset.step_count(), 0, "[{label}]");
}
