//! sitepush — incremental static-site publishing over FTP.
//!
//! # Usage
//!
//! ```text
//! sitepush hash   [-d DIR] [-e OUTPUT] [--version-label LABEL]
//! sitepush diff   [-b NEW] [-e OLD] [-i OUTPUT] [--fold canonical|legacy]
//! sitepush server [-s HOST] [-p PORT] [-u USER] [-w PASSWORD] deploy [-f DIFF] [-d DIR] [-a ROOT] [--dry-run]
//! sitepush server [-s HOST] [-p PORT] [-u USER] [-w PASSWORD] latest [-o LOCAL] [-r REMOTE]
//! sitepush version [--short] [--output json|yaml]
//! ```
//!
//! Every setting can also come from `SITEPUSH_<KEY>` or a `.sitepush.yaml`
//! config file, in that order of precedence below the flag.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{diff::DiffArgs, hash::HashArgs, server::ServerArgs, version::VersionArgs};
use sitepush_core::config::FileConfig;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "sitepush",
    version,
    about = "Publish a static site to an FTP server, uploading only what changed",
    long_about = None,
)]
struct Cli {
    /// Config file (default: ./.sitepush.yaml, then ~/.sitepush.yaml).
    #[arg(long, global = true, env = "SITEPUSH_CONFIG")]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Snapshot the content hashes of the built site.
    Hash(HashArgs),

    /// Compare two snapshots and write the changeset.
    Diff(DiffArgs),

    /// Talk to the FTP server.
    Server(ServerArgs),

    /// Print build information.
    Version(VersionArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Hash(args) => args.run(&load_config(config)?),
        Commands::Diff(args) => args.run(&load_config(config)?),
        Commands::Server(args) => args.run(&load_config(config)?),
        Commands::Version(args) => args.run(),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<FileConfig> {
    let (file, used) = FileConfig::discover(explicit).context("failed to load configuration")?;
    if let Some(path) = used {
        tracing::info!("Using config file: {}", path.display());
    }
    Ok(file)
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
