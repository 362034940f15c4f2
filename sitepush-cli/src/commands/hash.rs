//! `sitepush hash` — snapshot the built site.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use sitepush_core::config::{
    FileConfig, HashConfig, DEFAULT_HASH_DIRECTORY, DEFAULT_HASH_OUTPUT_FILE,
};
use sitepush_sync::create_snapshot;

/// Arguments for `sitepush hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Directory to hash [default: public/].
    #[arg(short = 'd', long = "hash-directory", env = "SITEPUSH_HASH_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Snapshot file to write [default: public/latest.hash].
    #[arg(short = 'e', long = "hash-output-file", env = "SITEPUSH_HASH_OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,

    /// Version label to record instead of the short git revision.
    #[arg(long, env = "SITEPUSH_VERSION_LABEL")]
    pub version_label: Option<String>,
}

impl HashArgs {
    pub fn run(self, file: &FileConfig) -> Result<()> {
        let config = self.resolve(file);
        create_snapshot(&config).with_context(|| {
            format!("failed to hash directory {}", config.directory.display())
        })?;
        Ok(())
    }

    fn resolve(self, file: &FileConfig) -> HashConfig {
        HashConfig {
            directory: self
                .directory
                .or_else(|| file.hash_directory.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HASH_DIRECTORY)),
            output_file: self
                .output_file
                .or_else(|| file.hash_output_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HASH_OUTPUT_FILE)),
            version_label: self.version_label.or_else(|| file.version_label.clone()),
        }
    }
}
