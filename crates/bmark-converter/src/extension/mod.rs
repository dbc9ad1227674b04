//! Extensions: pluggable grammar, output post-processing and listeners.
//!
//! Callers describe an extension with an [`ExtensionSpec`]. Validation turns
//! specs into [`Extension`] values, which are immutable from then on.
//!
//! - `lang` extensions run on the source text before any grammar pass.
//! - `output` extensions run on the finished HTML.
//! - `listener` extensions only register event listeners.
//!
//! Any extension may carry listeners in addition to its transform.

mod legacy;
mod registry;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::converter::Converter;
use crate::error::{InvalidReason, ValidationError};
use crate::event::{ListenerFn, Stage};
use crate::options::ConversionOptions;

pub use legacy::LegacyExtension;
pub use registry::ExtensionRegistry;

/// Filter callback of a `lang` or `output` extension.
pub type FilterFn = dyn Fn(&str, &Converter, &ConversionOptions) -> String + Send + Sync;

/// An extension as described by its author, before validation.
///
/// # Example
///
/// ```
/// use bmark_converter::{Converter, ExtensionSpec};
///
/// let mut converter = Converter::default();
/// converter
///     .add_extension(ExtensionSpec::lang().regex("hello").replace("world"))
///     .unwrap();
/// assert!(converter.to_html("hello").contains("world"));
/// ```
#[derive(Clone, Default)]
pub struct ExtensionSpec {
    kind: Option<String>,
    regex: Option<String>,
    replace: Option<String>,
    filter: Option<Arc<FilterFn>>,
    listeners: Option<Vec<(String, Arc<ListenerFn>)>>,
}

impl ExtensionSpec {
    /// An empty spec; set at least a type before registering it.
    pub fn new() -> Self {
        Self::default()
    }

    /// A `lang` spec.
    pub fn lang() -> Self {
        Self::new().kind("lang")
    }

    /// An `output` spec.
    pub fn output() -> Self {
        Self::new().kind("output")
    }

    /// A `listener` spec.
    pub fn listener() -> Self {
        Self::new().kind("listener")
    }

    /// Set the type: `lang`, `language`, `output`, `html` or `listener`.
    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Pattern replaced in every match.
    #[must_use]
    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    /// Replacement for [`regex`](Self::regex); `$1` and `${name}` expand.
    #[must_use]
    pub fn replace(mut self, replacement: impl Into<String>) -> Self {
        self.replace = Some(replacement.into());
        self
    }

    /// Transform the text with a function.
    #[must_use]
    pub fn filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &Converter, &ConversionOptions) -> String + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Register a listener for a stage such as `"headers.after"`.
    #[must_use]
    pub fn on<F>(mut self, stage: impl Into<String>, listener: F) -> Self
    where
        F: Fn(&mut crate::Event<'_>) + Send + Sync + 'static,
    {
        self.listeners
            .get_or_insert_with(Vec::new)
            .push((stage.into(), Arc::new(listener)));
        self
    }
}

impl fmt::Debug for ExtensionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionSpec")
            .field("kind", &self.kind)
            .field("regex", &self.regex)
            .field("replace", &self.replace)
            .field("filter", &self.filter.is_some())
            .field(
                "listeners",
                &self
                    .listeners
                    .as_ref()
                    .map(|l| l.iter().map(|(stage, _)| stage.as_str()).collect::<Vec<_>>()),
            )
            .finish()
    }
}

/// Where in the pipeline an extension runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtensionKind {
    /// Runs on the source text.
    Lang,
    /// Runs on the finished HTML.
    Output,
    /// Only registers listeners.
    Listener,
}

impl ExtensionKind {
    fn parse(kind: &str) -> Option<Self> {
        match kind.to_lowercase().as_str() {
            "lang" | "language" => Some(Self::Lang),
            "output" | "html" => Some(Self::Output),
            "listener" => Some(Self::Listener),
            _ => None,
        }
    }

    /// Normalized type name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Lang => "lang",
            Self::Output => "output",
            Self::Listener => "listener",
        }
    }
}

#[derive(Clone)]
enum Transform {
    Replace { pattern: Regex, replacement: String },
    Filter(Arc<FilterFn>),
}

/// A validated extension.
#[derive(Clone)]
pub struct Extension {
    kind: ExtensionKind,
    transform: Option<Transform>,
    listeners: Vec<(Stage, Arc<ListenerFn>)>,
}

impl Extension {
    /// Normalized type.
    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    /// Pattern of a regex extension.
    pub fn pattern(&self) -> Option<&str> {
        match &self.transform {
            Some(Transform::Replace { pattern, .. }) => Some(pattern.as_str()),
            _ => None,
        }
    }

    /// Replacement of a regex extension.
    pub fn replacement(&self) -> Option<&str> {
        match &self.transform {
            Some(Transform::Replace { replacement, .. }) => Some(replacement),
            _ => None,
        }
    }

    /// Whether the extension transforms text with a filter function.
    pub fn has_filter(&self) -> bool {
        matches!(self.transform, Some(Transform::Filter(_)))
    }

    /// Stages the extension listens to.
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.listeners.iter().map(|(stage, _)| *stage)
    }

    pub(crate) fn listeners(&self) -> &[(Stage, Arc<ListenerFn>)] {
        &self.listeners
    }

    /// Apply the transform to `text`.
    pub(crate) fn apply(
        &self,
        text: &str,
        converter: &Converter,
        options: &ConversionOptions,
    ) -> String {
        match &self.transform {
            Some(Transform::Replace {
                pattern,
                replacement,
            }) => pattern.replace_all(text, replacement.as_str()).into_owned(),
            Some(Transform::Filter(filter)) => filter(text, converter, options),
            None => text.to_owned(),
        }
    }
}

impl fmt::Debug for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extension")
            .field("kind", &self.kind)
            .field("pattern", &self.pattern())
            .field("replacement", &self.replacement())
            .field("filter", &self.has_filter())
            .field("stages", &self.stages().collect::<Vec<_>>())
            .finish()
    }
}

/// Zero-argument factory producing extension specs.
pub type FactoryFn = dyn Fn() -> Vec<ExtensionSpec> + Send + Sync;

/// Anything accepted where extensions are registered.
#[derive(Clone)]
pub enum ExtensionSource {
    /// One spec.
    Single(ExtensionSpec),
    /// Several specs registered together.
    Many(Vec<ExtensionSpec>),
    /// A factory called once at registration.
    Factory(Arc<FactoryFn>),
}

impl ExtensionSource {
    /// Wrap a factory function.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn() -> Vec<ExtensionSpec> + Send + Sync + 'static,
    {
        Self::Factory(Arc::new(factory))
    }

    fn into_specs(self) -> Vec<ExtensionSpec> {
        match self {
            Self::Single(spec) => vec![spec],
            Self::Many(specs) => specs,
            Self::Factory(factory) => factory(),
        }
    }
}

impl From<ExtensionSpec> for ExtensionSource {
    fn from(spec: ExtensionSpec) -> Self {
        Self::Single(spec)
    }
}

impl From<Vec<ExtensionSpec>> for ExtensionSource {
    fn from(specs: Vec<ExtensionSpec>) -> Self {
        Self::Many(specs)
    }
}

impl fmt::Debug for ExtensionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(spec) => f.debug_tuple("Single").field(spec).finish(),
            Self::Many(specs) => f.debug_tuple("Many").field(specs).finish(),
            Self::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// Normalize an extension name for registry lookups.
///
/// Drops whitespace and the characters `_?*+/\.^-`, then lowercases.
pub fn std_ext_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace() && !"_?*+/\\.^-".contains(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Validate a source, producing immutable extensions.
///
/// # Errors
///
/// Fails on the first invalid sub-extension, naming its index.
pub fn validate(
    source: impl Into<ExtensionSource>,
    name: Option<&str>,
) -> Result<Vec<Extension>, ValidationError> {
    source
        .into()
        .into_specs()
        .into_iter()
        .enumerate()
        .map(|(index, spec)| {
            validate_one(spec).map_err(|reason| ValidationError {
                extension: name.map(str::to_owned),
                index,
                reason,
            })
        })
        .collect()
}

fn validate_one(spec: ExtensionSpec) -> Result<Extension, InvalidReason> {
    let raw_kind = spec.kind.ok_or(InvalidReason::MissingType)?;
    let kind =
        ExtensionKind::parse(&raw_kind).ok_or(InvalidReason::UnrecognizedType(raw_kind))?;

    if kind == ExtensionKind::Listener {
        if spec.listeners.is_none() {
            return Err(InvalidReason::MissingListeners);
        }
    } else if spec.filter.is_none() && spec.regex.is_none() {
        return Err(InvalidReason::MissingTransform(kind.name()));
    }

    let listeners = spec
        .listeners
        .unwrap_or_default()
        .into_iter()
        .map(|(name, listener)| {
            name.parse::<Stage>()
                .map(|stage| (stage, listener))
                .map_err(|_| InvalidReason::UnknownStage(name))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let transform = match (kind, spec.regex, spec.filter) {
        (ExtensionKind::Listener, _, _) => None,
        (_, Some(pattern), _) => {
            let replacement = spec.replace.ok_or(InvalidReason::MissingReplace)?;
            let compiled = Regex::new(&pattern)
                .map_err(|source| InvalidReason::InvalidRegex { pattern, source })?;
            Some(Transform::Replace {
                pattern: compiled,
                replacement,
            })
        }
        (_, None, Some(filter)) => Some(Transform::Filter(filter)),
        (_, None, None) => None,
    };

    Ok(Extension {
        kind,
        transform,
        listeners,
    })
}
