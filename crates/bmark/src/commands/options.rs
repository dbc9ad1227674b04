//! `bmark options` command implementation.

use std::io::{self, Write};
use std::path::PathBuf;

use bmark_config::{CliSettings, Config, Flavor};
use clap::Args;

use crate::error::CliError;

/// Arguments for the options command.
#[derive(Args, Default)]
pub(crate) struct OptionsArgs {
    /// Option preset to resolve (overrides config).
    #[arg(long)]
    flavor: Option<Flavor>,

    /// Path to configuration file (default: auto-discover bmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl OptionsArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let json = self.resolve()?;
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{json}")?;
        Ok(())
    }

    /// Effective options after layering flavor, config and CLI, as JSON.
    fn resolve(&self) -> Result<String, CliError> {
        let settings = CliSettings {
            flavor: self.flavor,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&settings))?;
        Ok(serde_json::to_string_pretty(&config.options_resolved)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resolve_flavor_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bmark.toml");
        std::fs::write(&path, "[options]\ntables = false\n").unwrap();

        let json = OptionsArgs {
            flavor: Some(Flavor::Github),
            config: Some(path),
        }
        .resolve()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["tables"], serde_json::json!(false));
        assert_eq!(value["strikethrough"], serde_json::json!(true));
    }

    #[test]
    fn test_missing_config() {
        let err = OptionsArgs {
            flavor: None,
            config: Some(PathBuf::from("/nonexistent/bmark.toml")),
        }
        .resolve()
        .unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }
}
