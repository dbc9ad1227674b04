//! The public conversion entry point.

use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigurationError, ConvertError};
use crate::event::{Event, Listeners, Stage};
use crate::extension::{Extension, ExtensionKind, ExtensionRegistry, ExtensionSource, validate};
use crate::options::ConversionOptions;
use crate::parser::Parser;
use crate::store::Metadata;

/// Result of [`Converter::convert`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    /// Rendered HTML.
    pub html: String,
    /// Metadata block found at the top of the document, if any.
    pub metadata: Metadata,
}

/// Markdown to HTML converter.
///
/// A converter holds its options, extensions and listeners. Every
/// conversion gets fresh run state, so one converter can be shared between
/// threads and used for any number of documents.
///
/// # Example
///
/// ```
/// use bmark_converter::{ConversionOptions, Converter};
///
/// let converter = Converter::new(ConversionOptions {
///     container_class: None,
///     ..Default::default()
/// })
/// .unwrap();
/// assert_eq!(
///     converter.to_html("# Title\n\nSome **bold** text."),
///     "<h1 id=\"title\">Title</h1>\n<p>Some <strong>bold</strong> text.</p>"
/// );
/// ```
#[derive(Clone, Default)]
pub struct Converter {
    options: ConversionOptions,
    lang_extensions: Vec<Extension>,
    output_extensions: Vec<Extension>,
    listeners: Listeners,
}

impl Converter {
    /// Create a converter, resolving `options.extensions` against an empty
    /// registry.
    ///
    /// # Errors
    ///
    /// Fails when `options.extensions` names anything, since nothing is
    /// registered. Use [`with_registry`](Self::with_registry) for named
    /// extensions.
    pub fn new(options: ConversionOptions) -> Result<Self, ConfigurationError> {
        Self::with_registry(options, &ExtensionRegistry::new())
    }

    /// Create a converter, loading every extension named in
    /// `options.extensions` from `registry`.
    ///
    /// # Errors
    ///
    /// Returns the first name that cannot be resolved.
    pub fn with_registry(
        options: ConversionOptions,
        registry: &ExtensionRegistry,
    ) -> Result<Self, ConfigurationError> {
        let mut converter = Self {
            options,
            ..Self::default()
        };
        for name in converter.options.extensions.clone() {
            converter.use_extension(registry, &name)?;
        }
        Ok(converter)
    }

    /// Options this converter runs with.
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Validate and load anonymous extensions.
    ///
    /// # Errors
    ///
    /// Nothing is loaded when any sub-extension is invalid.
    pub fn add_extension(
        &mut self,
        source: impl Into<ExtensionSource>,
    ) -> Result<(), ConfigurationError> {
        let extensions = validate(source, None)?;
        self.load(extensions);
        Ok(())
    }

    /// Load the extensions registered under `name`.
    ///
    /// # Errors
    ///
    /// Fails when `name` is not registered.
    pub fn use_extension(
        &mut self,
        registry: &ExtensionRegistry,
        name: &str,
    ) -> Result<(), ConfigurationError> {
        let extensions = registry.resolve(name)?;
        self.load(extensions);
        Ok(())
    }

    /// Register `listener` for a stage such as `"headers.before"` or
    /// `"links.inline.captureStart"`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownStage`] for names that do not
    /// parse.
    pub fn listen<F>(&mut self, stage: &str, listener: F) -> Result<(), ConfigurationError>
    where
        F: Fn(&mut Event<'_>) + Send + Sync + 'static,
    {
        let stage: Stage = stage.parse()?;
        self.listeners.add(stage, Arc::new(listener));
        Ok(())
    }

    /// Convert Markdown to HTML.
    ///
    /// Never fails: anything that is not valid Markdown comes out as text.
    pub fn to_html(&self, text: &str) -> String {
        self.convert(text).html
    }

    /// Convert Markdown to HTML, enforcing `max_input_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InputTooLarge`] when the input is over the
    /// limit.
    pub fn try_to_html(&self, text: &str) -> Result<String, ConvertError> {
        Ok(self.try_convert(text)?.html)
    }

    /// [`convert`](Self::convert), enforcing `max_input_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InputTooLarge`] when the input is over the
    /// limit.
    pub fn try_convert(&self, text: &str) -> Result<Conversion, ConvertError> {
        if let Some(limit) = self.options.max_input_bytes
            && text.len() > limit
        {
            return Err(ConvertError::InputTooLarge {
                len: text.len(),
                limit,
            });
        }
        Ok(self.convert(text))
    }

    /// Convert Markdown to HTML, also returning the document's metadata.
    pub fn convert(&self, text: &str) -> Conversion {
        tracing::debug!(bytes = text.len(), "Converting document");
        let mut parser = Parser::new(self, 0);
        let html = parser.make_html(text, true);
        let state = parser.into_state();
        tracing::debug!(
            bytes = html.len(),
            blocks = state.html_blocks().len(),
            "Converted document"
        );
        Conversion {
            html,
            metadata: state.metadata,
        }
    }

    pub(crate) fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub(crate) fn lang_extensions(&self) -> &[Extension] {
        &self.lang_extensions
    }

    pub(crate) fn output_extensions(&self) -> &[Extension] {
        &self.output_extensions
    }

    fn load(&mut self, extensions: Vec<Extension>) {
        for extension in extensions {
            for (stage, listener) in extension.listeners() {
                self.listeners.add(*stage, Arc::clone(listener));
            }
            match extension.kind() {
                ExtensionKind::Lang => self.lang_extensions.push(extension),
                ExtensionKind::Output => self.output_extensions.push(extension),
                ExtensionKind::Listener => {}
            }
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("lang_extensions", &self.lang_extensions)
            .field("output_extensions", &self.output_extensions)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::extension::ExtensionSpec;
    use crate::{CaptureMatch, Pass};
    use pretty_assertions::assert_eq;

    fn converter() -> Converter {
        Converter::new(ConversionOptions {
            container_class: None,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_end_to_end() {
        assert_eq!(
            converter().to_html("# Title\n\nSome **bold** and _em_.\n"),
            "<h1 id=\"title\">Title</h1>\n<p>Some <strong>bold</strong> and <em>em</em>.</p>"
        );
    }

    #[test]
    fn test_unresolved_reference_stays_literal() {
        assert_eq!(converter().to_html("[foo][missing]"), "<p>[foo][missing]</p>");
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(converter().to_html("a\n\n---\n\nb"), "<p>a</p>\n<hr />\n<p>b</p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Converter::default().to_html(""), "");
    }

    #[test]
    fn test_default_wraps_in_container() {
        assert_eq!(
            Converter::default().to_html("hi"),
            "<div class=\"bmark-markdown\">\n<p>hi</p>\n</div>"
        );
    }

    #[test]
    fn test_markers_in_input_survive() {
        assert_eq!(converter().to_html("a ¨K0K $1 ¨"), "<p>a ¨K0K $1 ¨</p>");
    }

    #[test]
    fn test_unknown_extension_name() {
        let err = Converter::new(ConversionOptions {
            extensions: vec!["nope".to_owned()],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownExtension(name) if name == "nope"));
    }

    #[test]
    fn test_registry_extensions_by_name() {
        let mut registry = ExtensionRegistry::new();
        registry
            .register("shout", ExtensionSpec::output().regex("</p>").replace("!</p>"))
            .unwrap();
        let converter = Converter::with_registry(
            ConversionOptions {
                container_class: None,
                extensions: vec!["Shout".to_owned()],
                ..Default::default()
            },
            &registry,
        )
        .unwrap();
        assert_eq!(converter.to_html("hey"), "<p>hey!</p>");
    }

    #[test]
    fn test_lang_extension_runs_before_grammar() {
        let mut converter = converter();
        converter
            .add_extension(ExtensionSpec::lang().regex(r"\+\+(\w+)\+\+").replace("**$1**"))
            .unwrap();
        assert_eq!(converter.to_html("++big++"), "<p><strong>big</strong></p>");
    }

    #[test]
    fn test_invalid_extension_loads_nothing() {
        let mut converter = converter();
        let err = converter
            .add_extension(vec![
                ExtensionSpec::output().regex("a").replace("b"),
                ExtensionSpec::new(),
            ])
            .unwrap_err();
        assert!(err.to_string().contains("sub-extension 1"));
        assert_eq!(converter.to_html("a"), "<p>a</p>");
    }

    #[test]
    fn test_listener_rewrites_stage_text() {
        let mut converter = converter();
        converter
            .listen("paragraphs.after", |event| {
                let text = event.text().replace("<h1", "<h1 class=\"title\"");
                event.set_text(text);
            })
            .unwrap();
        assert_eq!(
            converter.to_html("# Hi"),
            "<h1 class=\"title\" id=\"hi\">Hi</h1>"
        );
    }

    #[test]
    fn test_listen_unknown_stage() {
        let mut converter = converter();
        let err = converter.listen("bogus.after", |_| {}).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownStage(_)));
    }

    #[test]
    fn test_prevent_default_skips_pass() {
        let mut converter = converter();
        converter
            .listen("italicsAndBold.before", |event| event.prevent_default())
            .unwrap();
        assert_eq!(converter.to_html("*a*"), "<p>*a*</p>");
    }

    #[test]
    fn test_after_fires_even_when_prevented() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut converter = converter();
        converter
            .listen("horizontalRule.before", |event| event.prevent_default())
            .unwrap();
        let sink = Arc::clone(&seen);
        converter
            .listen("horizontalRule.after", move |event| {
                sink.lock().unwrap().push(event.stage());
            })
            .unwrap();
        converter.to_html("x");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![Stage::after(Pass::HorizontalRule)]
        );
    }

    #[test]
    fn test_capture_listener_rewrites_link() {
        let mut converter = converter();
        converter
            .listen("links.inline.captureStart", |event| {
                if let Some(found) = event.matches().cloned() {
                    event.set_matches(CaptureMatch {
                        url: found.url.replace("http:", "https:"),
                        ..found
                    });
                }
            })
            .unwrap();
        assert_eq!(
            converter.to_html("[x](http://example.com)"),
            "<p><a href=\"https://example.com\">x</a></p>"
        );
    }

    #[test]
    fn test_try_to_html_limit() {
        let converter = Converter::new(ConversionOptions {
            container_class: None,
            max_input_bytes: Some(4),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(converter.try_to_html("abc").unwrap(), "<p>abc</p>");
        let err = converter.try_to_html("abcdef").unwrap_err();
        assert!(matches!(err, ConvertError::InputTooLarge { len: 6, limit: 4 }));
        assert_eq!(converter.to_html("abcdef"), "<p>abcdef</p>");
    }

    #[test]
    fn test_converter_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Converter>();
    }
}
