//! Error types for sitepush-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while reading or writing persisted records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// Underlying I/O failure, annotated with the file involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path and serde_yaml line context.
    #[error("failed to parse record at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The record file did not exist at the expected path.
    #[error("record not found at {path}")]
    NotFound { path: PathBuf },
}

/// Errors raised while assembling run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required setting was supplied by none of flag, environment or config file.
    #[error("missing required setting '{key}' (flag --{key}, env {env}, or config file)")]
    Missing { key: &'static str, env: &'static str },

    /// An explicitly requested config file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for the expected keys.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RecordError {
    RecordError::Io {
        path: path.into(),
        source,
    }
}
