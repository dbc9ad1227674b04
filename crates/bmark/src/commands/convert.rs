//! `bmark convert` command implementation.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use bmark_config::{CliSettings, Config, Flavor};
use bmark_document::{FrontMatter, render_document};
use clap::Args;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the convert command.
#[derive(Args, Default)]
#[allow(clippy::struct_excessive_bools)]
pub(crate) struct ConvertArgs {
    /// Markdown file to convert (default: stdin).
    file: Option<PathBuf>,

    /// Write HTML to this file (default: stdout).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to configuration file (default: auto-discover bmark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Option preset: vanilla, original, github, ghost or `allOn` (overrides config).
    #[arg(long)]
    flavor: Option<Flavor>,

    /// Wrap the result in a complete HTML document.
    #[arg(long)]
    complete_document: bool,

    /// Strip YAML front matter before converting.
    #[arg(long)]
    front_matter: bool,

    /// Parse a leading metadata block.
    #[arg(long)]
    metadata: bool,

    /// Class of the wrapping div (overrides config).
    #[arg(long)]
    container_class: Option<String>,

    /// Do not wrap the fragment in a div.
    #[arg(long)]
    no_wrapper: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl ConvertArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            flavor: self.flavor,
            container_class: self.container_class.clone(),
            wrapper: self.no_wrapper.then_some(false),
            metadata: self.metadata.then_some(true),
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        if self.verbose
            && let Some(path) = &config.config_path
        {
            output.info(&format!("Config: {}", path.display()));
        }

        let source = match &self.file {
            Some(path) => fs::read_to_string(path)?,
            None => {
                let mut source = String::new();
                io::stdin().read_to_string(&mut source)?;
                source
            }
        };
        let html = self.render(&source, &config, &output)?;

        match &self.output {
            Some(path) => {
                fs::write(path, &html)?;
                output.success(&format!("Wrote {}", path.display()));
            }
            None => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    fn render(&self, source: &str, config: &Config, output: &Output) -> Result<String, CliError> {
        let converter = config.converter()?;

        let (markdown, front_matter) = if self.front_matter {
            let parsed = FrontMatter::extract(source)?;
            if parsed.data.is_null() {
                output.warning("No front matter found");
            }
            (parsed.content, parsed.data)
        } else {
            (source.to_owned(), serde_yaml::Value::Null)
        };

        let conversion = converter.try_convert(&markdown)?;
        tracing::info!(
            input = markdown.len(),
            output = conversion.html.len(),
            "Converted"
        );

        if !self.complete_document {
            let mut html = conversion.html;
            if !html.is_empty() && !html.ends_with('\n') {
                html.push('\n');
            }
            return Ok(html);
        }

        let mut document = config.document.clone();
        if document.title.is_none() {
            document.title = front_matter
                .get("title")
                .and_then(serde_yaml::Value::as_str)
                .map(str::to_owned);
        }
        document.merge_metadata(&conversion.metadata);
        Ok(render_document(&conversion.html, &document))
    }
}
