//! `sitepush diff` — derive the changeset between two snapshots.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use sitepush_core::config::{
    DiffConfig, FileConfig, DEFAULT_DIFF_FILE, DEFAULT_NEW_HASH_FILE, DEFAULT_OLD_HASH_FILE,
};
use sitepush_core::{Changeset, FoldStrategy};
use sitepush_sync::diff_files;

/// Arguments for `sitepush diff`.
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Snapshot of the freshly built site [default: public/latest.hash].
    #[arg(short = 'b', long = "diff-new-hash-file", env = "SITEPUSH_DIFF_NEW_HASH_FILE")]
    pub new_snapshot: Option<PathBuf>,

    /// Snapshot of what is currently published [default: latest.hash].
    #[arg(short = 'e', long = "diff-old-hash-file", env = "SITEPUSH_DIFF_OLD_HASH_FILE")]
    pub old_snapshot: Option<PathBuf>,

    /// Changeset file to write [default: latest.diff].
    #[arg(short = 'i', long = "diff-file", env = "SITEPUSH_DIFF_FILE")]
    pub output_file: Option<PathBuf>,

    /// Directory folding strategy [default: canonical].
    #[arg(long, env = "SITEPUSH_FOLD", value_parser = parse_fold)]
    pub fold: Option<FoldStrategy>,
}

impl DiffArgs {
    pub fn run(self, file: &FileConfig) -> Result<()> {
        let config = self.resolve(file);
        let changeset = diff_files(&config).with_context(|| {
            format!(
                "failed to diff {} against {}",
                config.new_snapshot.display(),
                config.old_snapshot.display()
            )
        })?;

        print_summary(&config, &changeset);
        Ok(())
    }

    fn resolve(self, file: &FileConfig) -> DiffConfig {
        DiffConfig {
            old_snapshot: self
                .old_snapshot
                .or_else(|| file.diff_old_hash_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OLD_HASH_FILE)),
            new_snapshot: self
                .new_snapshot
                .or_else(|| file.diff_new_hash_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_NEW_HASH_FILE)),
            output_file: self
                .output_file
                .or_else(|| file.diff_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIFF_FILE)),
            fold: self.fold.or(file.fold).unwrap_or_default(),
        }
    }
}

fn parse_fold(value: &str) -> Result<FoldStrategy, String> {
    value.parse()
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "category")]
    category: &'static str,
    #[tabled(rename = "count")]
    count: usize,
}

fn print_summary(config: &DiffConfig, changeset: &Changeset) {
    println!(
        "{} {} -> {}",
        "changeset".bold(),
        changeset.old_version.to_string().dimmed(),
        changeset.new_version.to_string().green()
    );

    let rows = [
        ("dir", changeset.directories.len()),
        ("add", changeset.add.len()),
        ("update", changeset.update.len()),
        ("delete", changeset.delete.len()),
        ("after", changeset.after.len()),
    ]
    .map(|(category, count)| CountRow { category, count });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if changeset.has_no_content_changes() {
        println!("{}", "no content changes".yellow());
    }
    println!("wrote {}", config.output_file.display());
}
