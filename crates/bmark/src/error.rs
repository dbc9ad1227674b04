//! CLI error types.

use bmark_config::ConfigError;
use bmark_converter::ConvertError;
use bmark_document::DocumentError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Convert(#[from] ConvertError),

    #[error("{0}")]
    Document(#[from] DocumentError),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
