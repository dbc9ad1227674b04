//! Configuration management for bmark.
//!
//! Parses `bmark.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! Conversion options are layered: defaults, then the [`Flavor`] preset,
//! then the `[options]` table, then [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `options.gh_mentions_link`
//! - `options.relative_path_base_url`
//! - `options.container_class`

mod expand;
mod flavor;

use std::path::{Path, PathBuf};

use bmark_converter::{ConfigurationError, ConversionOptions, Converter, ExtensionRegistry, ExtensionSpec};
use bmark_document::DocumentOptions;
use serde::Deserialize;

pub use flavor::{Flavor, UnknownFlavor};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the flavor preset.
    pub flavor: Option<Flavor>,
    /// Override the wrapper `<div>` class.
    pub container_class: Option<String>,
    /// `Some(false)` disables the wrapper `<div>`.
    pub wrapper: Option<bool>,
    /// Override metadata block parsing.
    pub metadata: Option<bool>,
    /// Override the input size limit.
    pub max_input_bytes: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "bmark.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Flavor preset named in the file.
    pub flavor: Option<Flavor>,
    /// Raw `[options]` table, layered over the flavor preset.
    options: toml::Table,
    /// Settings for complete HTML documents.
    pub document: DocumentOptions,
    /// Declarative regex extensions.
    pub extensions: Vec<ExtensionConfig>,

    /// Resolved conversion options (set after loading).
    #[serde(skip)]
    pub options_resolved: ConversionOptions,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// A regex extension declared in `[[extensions]]`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionConfig {
    /// Registry name.
    pub name: String,
    /// `lang` or `output`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Pattern to replace.
    pub regex: String,
    /// Replacement; `$1` and `${name}` expand.
    pub replace: String,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`options.container_class`").
        field: String,
        /// Error message (e.g., "${`DOCS_URL`} not set").
        message: String,
    },
    /// A configured extension was rejected by the converter.
    #[error(transparent)]
    Extension(#[from] ConfigurationError),
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `bmark.toml` in current directory and parents.
    ///
    /// CLI settings are applied last, taking precedence over the flavor and
    /// the `[options]` table.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails
    /// or a resolved value is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        config.resolve(cli_settings)?;
        Ok(config)
    }

    /// Build a converter with the resolved options and configured extensions.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Extension` if an extension is invalid.
    pub fn converter(&self) -> Result<Converter, ConfigError> {
        let registry = self.registry()?;
        Ok(Converter::with_registry(
            self.options_resolved.clone(),
            &registry,
        )?)
    }

    /// Registry holding every `[[extensions]]` entry.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Extension` for the first invalid entry.
    pub fn registry(&self) -> Result<ExtensionRegistry, ConfigError> {
        let mut registry = ExtensionRegistry::new();
        for extension in &self.extensions {
            let spec = ExtensionSpec::new()
                .kind(&extension.kind)
                .regex(&extension.regex)
                .replace(&extension.replace);
            registry
                .register(&extension.name, spec)
                .map_err(ConfigurationError::from)?;
        }
        Ok(registry)
    }

    /// Search for config file in `start` and its parents.
    fn discover_config(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Compute `options_resolved` from the layers and validate it.
    fn resolve(&mut self, cli_settings: Option<&CliSettings>) -> Result<(), ConfigError> {
        let flavor = cli_settings
            .and_then(|settings| settings.flavor)
            .or(self.flavor)
            .unwrap_or_default();
        let mut options = self.layered_options(flavor)?;

        if let Some(settings) = cli_settings {
            apply_cli_settings(&mut options, settings);
        }
        expand_env_vars(&mut options)?;
        if options.container_class.as_deref() == Some("") {
            options.container_class = None;
        }
        for extension in &self.extensions {
            if !options.extensions.contains(&extension.name) {
                options.extensions.push(extension.name.clone());
            }
        }

        self.options_resolved = options;
        self.validate()
    }

    /// The flavor preset with the `[options]` table applied on top.
    fn layered_options(&self, flavor: Flavor) -> Result<ConversionOptions, ConfigError> {
        if self.options.is_empty() {
            return Ok(flavor.options());
        }
        let mut table = toml::Table::try_from(flavor.options()).map_err(|e| {
            ConfigError::Validation(format!("cannot apply flavor {flavor}: {e}"))
        })?;
        table.extend(self.options.clone());
        Ok(table.try_into()?)
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let options = &self.options_resolved;
        if !(1..=6).contains(&options.header_level_start) {
            return Err(ConfigError::Validation(
                "options.header_level_start must be between 1 and 6".to_owned(),
            ));
        }
        if options.gh_mentions && !options.gh_mentions_link.contains("{u}") {
            return Err(ConfigError::Validation(
                "options.gh_mentions_link must contain {u}".to_owned(),
            ));
        }
        if let Some(base) = &options.relative_path_base_url {
            require_http_url(base, "options.relative_path_base_url")?;
        }
        for extension in &self.extensions {
            require_non_empty(&extension.name, "extensions.name")?;
        }
        Ok(())
    }
}

/// Apply CLI settings to resolved options.
fn apply_cli_settings(options: &mut ConversionOptions, settings: &CliSettings) {
    if let Some(class) = &settings.container_class {
        options.container_class = Some(class.clone());
    }
    if settings.wrapper == Some(false) {
        options.container_class = None;
    }
    if let Some(metadata) = settings.metadata {
        options.metadata = metadata;
    }
    if let Some(limit) = settings.max_input_bytes {
        options.max_input_bytes = Some(limit);
    }
}

/// Expand environment variable references in option strings.
fn expand_env_vars(options: &mut ConversionOptions) -> Result<(), ConfigError> {
    options.gh_mentions_link =
        expand::expand_env(&options.gh_mentions_link, "options.gh_mentions_link")?;
    options.relative_path_base_url = expand::expand_env_opt(
        options.relative_path_base_url.as_deref(),
        "options.relative_path_base_url",
    )?;
    options.container_class =
        expand::expand_env_opt(options.container_class.as_deref(), "options.container_class")?;
    Ok(())
}
