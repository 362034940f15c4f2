//! Deploy and download entrypoints shared by the CLI.
//!
//! Both open exactly one remote session, use it, and close it. A failed run
//! still attempts to close the session before returning the first error.

use sitepush_core::{
    config::{DeployConfig, FtpTarget, LatestConfig},
    records, Changeset,
};

use crate::apply::{apply_changeset, ApplyReport};
use crate::error::SyncError;
use crate::ftp::FtpStore;
use crate::remote::{DryRunStore, RemoteStore};

/// Where a deploy sends its operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Log every operation without opening a connection.
    DryRun,
    /// A real FTP server.
    Ftp(FtpTarget),
}

/// Load the changeset in `config` and replay it against `destination`.
///
/// The changeset is read before any connection is opened, so a missing or
/// malformed diff file never touches the network.
pub fn deploy(config: &DeployConfig, destination: &Destination) -> Result<ApplyReport, SyncError> {
    let changeset = load(config)?;
    match destination {
        Destination::DryRun => replay(&changeset, config, &mut DryRunStore::new()),
        Destination::Ftp(target) => {
            let mut store = FtpStore::connect(target)?;
            replay(&changeset, config, &mut store)
        }
    }
}

/// [`deploy`] against an already opened store.
pub fn deploy_with<S>(config: &DeployConfig, store: &mut S) -> Result<ApplyReport, SyncError>
where
    S: RemoteStore + ?Sized,
{
    let changeset = match load(config) {
        Ok(changeset) => changeset,
        Err(err) => {
            close_quietly(store);
            return Err(err);
        }
    };
    replay(&changeset, config, store)
}

fn load(config: &DeployConfig) -> Result<Changeset, SyncError> {
    tracing::info!("Start deployment {}", config.diff_file.display());
    let changeset = records::load_changeset(&config.diff_file)?;
    tracing::debug!(
        "deploy {} -> {} ({} steps)",
        changeset.old_version,
        changeset.new_version,
        changeset.step_count()
    );
    Ok(changeset)
}

fn replay<S>(
    changeset: &Changeset,
    config: &DeployConfig,
    store: &mut S,
) -> Result<ApplyReport, SyncError>
where
    S: RemoteStore + ?Sized,
{
    match apply_changeset(changeset, &config.source_dir, &config.remote_root, store) {
        Ok(report) => {
            close(store)?;
            Ok(report)
        }
        Err(err) => {
            close_quietly(store);
            Err(err)
        }
    }
}

/// Download the remote snapshot named in `config` from `target`.
pub fn download_latest(config: &LatestConfig, target: &FtpTarget) -> Result<usize, SyncError> {
    let mut store = FtpStore::connect(target)?;
    fetch_latest(config, &mut store)
}

/// Retrieve `config.remote_file` from `store` and write it atomically to
/// `config.local_file`. Returns the number of bytes written.
pub fn fetch_latest<S>(config: &LatestConfig, store: &mut S) -> Result<usize, SyncError>
where
    S: RemoteStore + ?Sized,
{
    tracing::info!("Download latest hash file: {}", config.local_file.display());

    let bytes = match store.retrieve(&config.remote_file) {
        Ok(bytes) => bytes,
        Err(source) => {
            close_quietly(store);
            return Err(SyncError::Download {
                path: config.remote_file.clone(),
                source,
            });
        }
    };

    if let Err(err) = records::write_atomic(&config.local_file, &bytes) {
        close_quietly(store);
        return Err(err.into());
    }
    close(store)?;
    Ok(bytes.len())
}

fn close<S: RemoteStore + ?Sized>(store: &mut S) -> Result<(), SyncError> {
    store.close().map_err(SyncError::Close)
}

fn close_quietly<S: RemoteStore + ?Sized>(store: &mut S) {
    if let Err(err) = store.close() {
        tracing::warn!("closing remote session failed: {err}");
    }
}
