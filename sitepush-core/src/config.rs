//! Run configuration.
//!
//! Every setting resolves as: command-line flag > `SITEPUSH_*` environment
//! variable > YAML config file > built-in default. Flags and environment are
//! handled by the CLI parser; this module owns the config file and the
//! resolved per-command structs handed to the engine.
//!
//! # API pattern
//!
//! - `discover_at(explicit, cwd, home)` — explicit lookup roots; used in tests
//! - `discover(explicit)` — derives roots from the process, delegates to `_at`

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::types::FoldStrategy;

/// File name probed in the working directory and then the home directory.
pub const CONFIG_FILE_NAME: &str = ".sitepush.yaml";

pub const DEFAULT_HASH_DIRECTORY: &str = "public/";
pub const DEFAULT_HASH_OUTPUT_FILE: &str = "public/latest.hash";
pub const DEFAULT_DIFF_FILE: &str = "latest.diff";
pub const DEFAULT_NEW_HASH_FILE: &str = "public/latest.hash";
pub const DEFAULT_OLD_HASH_FILE: &str = "latest.hash";
pub const DEFAULT_FTP_PORT: u16 = 21;
pub const DEFAULT_REMOTE_ROOT: &str = "/";
pub const DEFAULT_LATEST_FILE: &str = "latest.hash";
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Contents of `.sitepush.yaml`. Keys mirror the long flag names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileConfig {
    pub hash_directory: Option<PathBuf>,
    pub hash_output_file: Option<PathBuf>,
    pub version_label: Option<String>,

    pub diff_file: Option<PathBuf>,
    pub diff_new_hash_file: Option<PathBuf>,
    pub diff_old_hash_file: Option<PathBuf>,
    pub fold: Option<FoldStrategy>,

    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,

    pub deploy_diff_file: Option<PathBuf>,
    pub deploy_directory: Option<PathBuf>,
    pub deploy_path: Option<String>,

    pub latest_local_file: Option<PathBuf>,
    pub latest_remote_file: Option<String>,
}

impl FileConfig {
    /// Parse a config file that must exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Locate and load the config file.
    ///
    /// An `explicit` path must exist. Otherwise `<cwd>/.sitepush.yaml` then
    /// `<home>/.sitepush.yaml` are tried; finding neither yields defaults.
    /// Returns the path actually used alongside the config.
    pub fn discover_at(
        explicit: Option<&Path>,
        cwd: &Path,
        home: Option<&Path>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load(path)?, Some(path.to_path_buf())));
        }

        let candidates = std::iter::once(cwd.join(CONFIG_FILE_NAME))
            .chain(home.map(|h| h.join(CONFIG_FILE_NAME)));
        for candidate in candidates {
            if candidate.is_file() {
                return Ok((Self::load(&candidate)?, Some(candidate)));
            }
        }
        Ok((Self::default(), None))
    }

    /// `discover_at` convenience wrapper using the process working directory
    /// and `dirs::home_dir()`.
    pub fn discover(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home = dirs::home_dir();
        Self::discover_at(explicit, &cwd, home.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Resolved per-command settings
// ---------------------------------------------------------------------------

/// Settings for producing a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashConfig {
    /// Root of the tree to hash.
    pub directory: PathBuf,
    /// Where the snapshot record is written.
    pub output_file: PathBuf,
    /// Explicit version label; `None` means "ask the VCS".
    pub version_label: Option<String>,
}

/// Settings for deriving a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffConfig {
    pub old_snapshot: PathBuf,
    pub new_snapshot: PathBuf,
    pub output_file: PathBuf,
    pub fold: FoldStrategy,
}

/// FTP endpoint and credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct FtpTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub dial_timeout: Duration,
}

impl FtpTarget {
    /// Build a target, failing on the first required value that is absent
    /// or empty.
    pub fn new(
        host: Option<String>,
        port: Option<u16>,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            host: required(host, "host", "SITEPUSH_HOST")?,
            port: port.unwrap_or(DEFAULT_FTP_PORT),
            username: required(username, "username", "SITEPUSH_USERNAME")?,
            password: required(password, "password", "SITEPUSH_PASSWORD")?,
            dial_timeout: DIAL_TIMEOUT,
        })
    }

    /// `host:port` as dialled.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for FtpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FtpTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("dial_timeout", &self.dial_timeout)
            .finish()
    }
}

/// Settings for replaying a changeset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployConfig {
    pub diff_file: PathBuf,
    /// Local tree the uploaded bytes are read from.
    pub source_dir: PathBuf,
    /// Remote directory all changeset paths are relative to.
    pub remote_root: String,
}

/// Settings for downloading the remote's current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestConfig {
    pub local_file: PathBuf,
    pub remote_file: String,
}

fn required(
    value: Option<String>,
    key: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing { key, env }),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
