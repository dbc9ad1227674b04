//! Error types.
//!
//! Conversion itself never fails: malformed Markdown degrades to literal
//! text. Errors come from building a converter (bad extensions, unknown
//! stage names) and from the size guard of
//! [`Converter::try_to_html`](crate::Converter::try_to_html).

/// Why an extension was rejected.
#[derive(Debug, thiserror::Error)]
pub enum InvalidReason {
    /// The extension has no type.
    #[error("must have a property called \"type\"")]
    MissingType,

    /// The type is not one of the known ones.
    #[error(
        "type \"{0}\" is not recognized. Valid values: \"lang/language\", \"output/html\" or \"listener\""
    )]
    UnrecognizedType(String),

    /// A listener extension without listeners.
    #[error("extensions of type \"listener\" must have a property called \"listeners\"")]
    MissingListeners,

    /// A lang or output extension without a regex or filter.
    #[error("{0} extensions must define either a \"regex\" property or a \"filter\" method")]
    MissingTransform(&'static str),

    /// A regex without a replacement.
    #[error("\"regex\" extensions must implement a replace string")]
    MissingReplace,

    /// The regex does not compile.
    #[error("invalid regex \"{pattern}\": {source}")]
    InvalidRegex {
        /// Offending pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },

    /// A listener names a stage that does not exist.
    #[error("the listener \"{0}\" does not name a known stage")]
    UnknownStage(String),
}

/// An extension failed validation.
#[derive(Debug, thiserror::Error)]
#[error("{}sub-extension {index}: {reason}", origin(.extension.as_deref()))]
pub struct ValidationError {
    /// Registered name, when the extension was registered under one.
    pub extension: Option<String>,
    /// Index of the offending sub-extension.
    pub index: usize,
    /// What is wrong with it.
    pub reason: InvalidReason,
}

fn origin(extension: Option<&str>) -> String {
    match extension {
        Some(name) => format!("Error in {name} extension->"),
        None => "Error in unnamed extension ".to_owned(),
    }
}

/// Errors raised while configuring a converter.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// An extension failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No extension is registered under this name.
    #[error("extension \"{0}\" is not registered")]
    UnknownExtension(String),

    /// A listener stage name was not recognized.
    #[error("unknown event stage \"{0}\"")]
    UnknownStage(String),
}

/// Errors from the guarded conversion entry point.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The input exceeds `max_input_bytes`.
    #[error("input of {len} bytes exceeds the limit of {limit} bytes")]
    InputTooLarge {
        /// Input length in bytes.
        len: usize,
        /// Configured limit.
        limit: usize,
    },
}
