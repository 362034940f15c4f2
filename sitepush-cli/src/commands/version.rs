//! `sitepush version` — build information.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;

/// Arguments for `sitepush version`.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Print just the version number.
    #[arg(short, long)]
    pub short: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
struct BuildInfo {
    version: &'static str,
    commit: &'static str,
    date: &'static str,
}

impl BuildInfo {
    fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("SITEPUSH_BUILD_COMMIT").unwrap_or("none"),
            date: option_env!("SITEPUSH_BUILD_DATE").unwrap_or("unknown"),
        }
    }
}

impl VersionArgs {
    pub fn run(self) -> Result<()> {
        print!("{}", render(&BuildInfo::current(), self.short, self.output)?);
        Ok(())
    }
}

fn render(info: &BuildInfo, short: bool, output: OutputFormat) -> Result<String> {
    if short {
        return Ok(format!("{}\n", info.version));
    }
    match output {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(info).context("failed to serialize JSON output")?;
            Ok(format!("{json}\n"))
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(info).context("failed to serialize YAML output")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BuildInfo {
        BuildInfo {
            version: "1.2.3",
            commit: "abc1234",
            date: "2024-01-01",
        }
    }

    #[test]
    fn short_prints_only_the_number() {
        assert_eq!(render(&info(), true, OutputFormat::Yaml).unwrap(), "1.2.3\n");
    }

    #[test]
    fn json_and_yaml_carry_all_fields() {
        let json = render(&info(), false, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["commit"], "abc1234");

        let yaml = render(&info(), false, OutputFormat::Yaml).unwrap();
        assert!(yaml.starts_with("version: 1.2.3\n"), "got: {yaml}");
        assert!(yaml.contains("commit: abc1234\n"), "got: {yaml}");
    }
}
