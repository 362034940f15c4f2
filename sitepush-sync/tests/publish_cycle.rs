use std::fs;
use std::path::{Path, PathBuf};

use sitepush_core::{
    config::{DeployConfig, DiffConfig, HashConfig, LatestConfig},
    records, FoldStrategy, Snapshot, VersionLabel,
};
use sitepush_sync::{create_snapshot, deploy_with, diff_files, fetch_latest, MemoryStore, Phase};
use tempfile::TempDir;

struct Workspace {
    _tmp: TempDir,
    root: PathBuf,
    site: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let tmp = TempDir::new().expect("tempdir");
        let root = tmp.path().to_path_buf();
        let site = root.join("public");
        fs::create_dir_all(&site).expect("create site");
        Self {
            _tmp: tmp,
            root,
            site,
        }
    }

    fn write(&self, path: &str, body: &str) {
        let full = self.site.join(path);
        fs::create_dir_all(full.parent().expect("parent")).expect("mkdir");
        fs::write(full, body).expect("write");
    }

    fn remove(&self, path: &str) {
        fs::remove_file(self.site.join(path)).expect("remove");
    }

    fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn hash(&self, label: &str) -> Snapshot {
        create_snapshot(&HashConfig {
            directory: self.site.clone(),
            output_file: self.site.join("latest.hash"),
            version_label: Some(label.to_string()),
        })
        .expect("hash")
    }

    fn diff(&self) -> sitepush_core::Changeset {
        diff_files(&DiffConfig {
            old_snapshot: self.path("latest.hash"),
            new_snapshot: self.site.join("latest.hash"),
            output_file: self.path("latest.diff"),
            fold: FoldStrategy::Canonical,
        })
        .expect("diff")
    }

    fn deploy(&self, store: &mut MemoryStore) -> sitepush_sync::ApplyReport {
        store.reopen();
        deploy_with(
            &DeployConfig {
                diff_file: self.path("latest.diff"),
                source_dir: self.site.clone(),
                remote_root: "/".to_string(),
            },
            store,
        )
        .expect("deploy")
    }

    fn fetch(&self, store: &mut MemoryStore) {
        store.reopen();
        fetch_latest(
            &LatestConfig {
                local_file: self.path("latest.hash"),
                remote_file: "latest.hash".to_string(),
            },
            store,
        )
        .expect("fetch");
    }
}

fn remote_text(store: &MemoryStore, path: &str) -> String {
    String::from_utf8(store.file(path).expect("remote file").to_vec()).expect("utf8")
}

fn local_text(path: &Path) -> String {
    fs::read_to_string(path).expect("read")
}

#[test]
fn first_publish_uploads_whole_tree() {
    let ws = Workspace::new();
    ws.write("index.html", "<h1>home</h1>");
    ws.write("img/logo.png", "png");
    records::save_snapshot(&ws.path("latest.hash"), &Snapshot::default()).expect("seed");

    let snapshot = ws.hash("v1");
    assert_eq!(snapshot.len(), 2, "snapshot must not include itself");

    let changeset = ws.diff();
    assert_eq!(changeset.add, vec!["img/logo.png", "index.html"]);
    assert_eq!(changeset.directories, vec!["img"]);

    let mut store = MemoryStore::new();
    let report = ws.deploy(&mut store);
    assert_eq!(report.total, 4);
    assert_eq!(
        store.file_paths(),
        vec!["img/logo.png", "index.html", "latest.hash"]
    );
    assert_eq!(
        remote_text(&store, "latest.hash"),
        local_text(&ws.site.join("latest.hash"))
    );
}

#[test]
fn incremental_publish_replays_only_changes() {
    let ws = Workspace::new();
    ws.write("index.html", "<h1>home</h1>");
    ws.write("img/logo.png", "png");
    records::save_snapshot(&ws.path("latest.hash"), &Snapshot::default()).expect("seed");
    ws.hash("v1");
    ws.diff();
    let mut store = MemoryStore::new();
    ws.deploy(&mut store);

    // Start the next cycle from what the server says is live.
    ws.fetch(&mut store);
    let live = records::load_snapshot(&ws.path("latest.hash")).expect("live");
    assert_eq!(live.version, VersionLabel::from("v1"));

    ws.write("index.html", "<h1>home v2</h1>");
    ws.write("css/site.css", "body{}");
    ws.remove("img/logo.png");
    ws.hash("v2");

    let changeset = ws.diff();
    assert_eq!(changeset.old_version, VersionLabel::from("v1"));
    assert_eq!(changeset.new_version, VersionLabel::from("v2"));
    assert_eq!(changeset.directories, vec!["css"]);
    assert_eq!(changeset.add, vec!["css/site.css"]);
    assert_eq!(changeset.update, vec!["index.html"]);
    assert_eq!(changeset.delete, vec!["img/logo.png"]);
    assert_eq!(changeset.after, vec!["latest.hash"]);

    let report = ws.deploy(&mut store);
    assert_eq!(report.count(Phase::Delete), 1);
    assert_eq!(
        store.file_paths(),
        vec!["css/site.css", "index.html", "latest.hash"]
    );
    assert_eq!(remote_text(&store, "index.html"), "<h1>home v2</h1>");
    assert!(store.is_closed());
}

#[test]
fn unchanged_tree_only_republishes_bookkeeping() {
    let ws = Workspace::new();
    ws.write("index.html", "<h1>home</h1>");
    records::save_snapshot(&ws.path("latest.hash"), &Snapshot::default()).expect("seed");
    ws.hash("v1");
    ws.diff();
    let mut store = MemoryStore::new();
    ws.deploy(&mut store);

    ws.fetch(&mut store);
    ws.hash("v1");
    let changeset = ws.diff();
    assert!(changeset.has_no_content_changes());
    assert!(changeset.directories.is_empty());

    let report = ws.deploy(&mut store);
    assert_eq!(report.total, 1);
    assert_eq!(report.count(Phase::After), 1);
}
