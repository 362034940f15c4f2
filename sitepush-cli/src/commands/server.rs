//! `sitepush server` — deploy a changeset or fetch the live snapshot.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use sitepush_core::config::{
    DeployConfig, FileConfig, FtpTarget, LatestConfig, DEFAULT_DIFF_FILE,
    DEFAULT_HASH_DIRECTORY, DEFAULT_LATEST_FILE, DEFAULT_REMOTE_ROOT,
};
use sitepush_sync::{deploy, download_latest, Destination, Phase};

/// Arguments for `sitepush server`.
#[derive(Args, Debug)]
pub struct ServerArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: ServerCommand,
}

/// FTP endpoint and credentials, accepted before or after the subcommand.
#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// FTP host name.
    #[arg(short = 's', long, global = true, env = "SITEPUSH_HOST")]
    pub host: Option<String>,

    /// FTP port [default: 21].
    #[arg(short = 'p', long, global = true, env = "SITEPUSH_PORT")]
    pub port: Option<u16>,

    /// FTP user name.
    #[arg(short = 'u', long, global = true, env = "SITEPUSH_USERNAME")]
    pub username: Option<String>,

    /// FTP password.
    #[arg(
        short = 'w',
        long,
        global = true,
        env = "SITEPUSH_PASSWORD",
        hide_env_values = true
    )]
    pub password: Option<String>,
}

impl ConnectionArgs {
    fn resolve(self, file: &FileConfig) -> Result<FtpTarget> {
        FtpTarget::new(
            self.host.or_else(|| file.host.clone()),
            self.port.or(file.port),
            self.username.or_else(|| file.username.clone()),
            self.password.or_else(|| file.password.clone()),
        )
        .context("incomplete server settings")
    }
}

#[derive(Subcommand, Debug)]
pub enum ServerCommand {
    /// Replay a changeset against the server.
    Deploy(DeployArgs),

    /// Download the snapshot currently published on the server.
    Latest(LatestArgs),
}

/// Arguments for `sitepush server deploy`.
#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Changeset to replay [default: latest.diff].
    #[arg(short = 'f', long = "deploy-diff-file", env = "SITEPUSH_DEPLOY_DIFF_FILE")]
    pub diff_file: Option<PathBuf>,

    /// Local site directory the uploads are read from [default: public/].
    #[arg(short = 'd', long = "deploy-directory", env = "SITEPUSH_DEPLOY_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Remote directory the site lives in [default: /].
    #[arg(short = 'a', long = "deploy-path", env = "SITEPUSH_DEPLOY_PATH")]
    pub remote_root: Option<String>,

    /// Log every operation without connecting.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for `sitepush server latest`.
#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Local file to write [default: latest.hash].
    #[arg(short = 'o', long = "latest-local-file", env = "SITEPUSH_LATEST_LOCAL_FILE")]
    pub local_file: Option<PathBuf>,

    /// Remote file to download [default: latest.hash].
    #[arg(short = 'r', long = "latest-remote-file", env = "SITEPUSH_LATEST_REMOTE_FILE")]
    pub remote_file: Option<String>,
}

impl ServerArgs {
    pub fn run(self, file: &FileConfig) -> Result<()> {
        match self.command {
            ServerCommand::Deploy(args) => args.run(self.connection, file),
            ServerCommand::Latest(args) => args.run(self.connection, file),
        }
    }
}

impl DeployArgs {
    fn run(self, connection: ConnectionArgs, file: &FileConfig) -> Result<()> {
        let destination = if self.dry_run {
            Destination::DryRun
        } else {
            Destination::Ftp(connection.resolve(file)?)
        };
        let config = self.resolve(file);

        let report = deploy(&config, &destination).with_context(|| {
            format!("deployment of {} failed", config.diff_file.display())
        })?;

        let summary = format!(
            "{} steps: {} dirs, {} added, {} updated, {} deleted",
            report.steps.len(),
            report.count(Phase::MakeDir),
            report.count(Phase::Add),
            report.count(Phase::Update),
            report.count(Phase::Delete),
        );
        match destination {
            Destination::DryRun => println!("{} {summary}", "dry-run".yellow()),
            Destination::Ftp(target) => {
                println!("{} {summary} on {}", "deployed".green(), target.address())
            }
        }
        Ok(())
    }

    fn resolve(self, file: &FileConfig) -> DeployConfig {
        DeployConfig {
            diff_file: self
                .diff_file
                .or_else(|| file.deploy_diff_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DIFF_FILE)),
            source_dir: self
                .directory
                .or_else(|| file.deploy_directory.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HASH_DIRECTORY)),
            remote_root: self
                .remote_root
                .or_else(|| file.deploy_path.clone())
                .unwrap_or_else(|| DEFAULT_REMOTE_ROOT.to_string()),
        }
    }
}

impl LatestArgs {
    fn run(self, connection: ConnectionArgs, file: &FileConfig) -> Result<()> {
        let target = connection.resolve(file)?;
        let config = self.resolve(file);

        let bytes = download_latest(&config, &target).with_context(|| {
            format!(
                "failed to download {} from {}",
                config.remote_file,
                target.address()
            )
        })?;
        println!(
            "{} {} ({bytes} bytes)",
            "downloaded".green(),
            config.local_file.display()
        );
        Ok(())
    }

    fn resolve(self, file: &FileConfig) -> LatestConfig {
        LatestConfig {
            local_file: self
                .local_file
                .or_else(|| file.latest_local_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LATEST_FILE)),
            remote_file: self
                .remote_file
                .or_else(|| file.latest_remote_file.clone())
                .unwrap_or_else(|| DEFAULT_LATEST_FILE.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_connection() -> ConnectionArgs {
        ConnectionArgs {
            host: None,
            port: None,
            username: None,
            password: None,
        }
    }

    #[test]
    fn connection_falls_back_to_config_file() {
        let file = FileConfig {
            host: Some("ftp.example.org".into()),
            username: Some("deploy".into()),
            password: Some("secret".into()),
            port: Some(2121),
            ..FileConfig::default()
        };
        let target = no_connection().resolve(&file).unwrap();
        assert_eq!(target.address(), "ftp.example.org:2121");
        assert_eq!(target.username, "deploy");
    }

    #[test]
    fn missing_host_names_the_setting() {
        let err = no_connection().resolve(&FileConfig::default()).unwrap_err();
        let message = format!("{err:#}");
        assert!(message.contains("host"), "got: {message}");
        assert!(message.contains("SITEPUSH_HOST"), "got: {message}");
    }

    #[test]
    fn deploy_defaults() {
        let args = DeployArgs {
            diff_file: None,
            directory: None,
            remote_root: None,
            dry_run: false,
        };
        let config = args.resolve(&FileConfig::default());
        assert_eq!(config.diff_file, PathBuf::from("latest.diff"));
        assert_eq!(config.source_dir, PathBuf::from("public/"));
        assert_eq!(config.remote_root, "/");
    }

    #[test]
    fn latest_flag_wins_over_config_file() {
        let file = FileConfig {
            latest_remote_file: Some("site.hash".into()),
            latest_local_file: Some(PathBuf::from("from-file.hash")),
            ..FileConfig::default()
        };
        let args = LatestArgs {
            local_file: Some(PathBuf::from("from-flag.hash")),
            remote_file: None,
        };
        let config = args.resolve(&file);
        assert_eq!(config.local_file, PathBuf::from("from-flag.hash"));
        assert_eq!(config.remote_file, "site.hash");
    }
}
