//! Pipeline stages and the events dispatched around them.
//!
//! Every grammar pass fires a `before` event with its input and an `after`
//! event with its output. Listeners registered for a [`Stage`] see an
//! [`Event`] and may rewrite its text; the next listener, and finally the
//! pass itself, continue with the rewritten text.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ConfigurationError;
use crate::options::ConversionOptions;
use crate::store::RunState;

/// Listener callback.
pub type ListenerFn = dyn Fn(&mut Event<'_>) + Send + Sync;

macro_rules! passes {
    ($($variant:ident => $name:literal,)+) => {
        /// A named pass of the conversion pipeline.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Pass {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )+
        }

        impl Pass {
            /// Every pass, in declaration order.
            pub const ALL: &'static [Pass] = &[$(Pass::$variant,)+];

            /// Name used in listener stage strings.
            pub fn name(self) -> &'static str {
                match self {
                    $(Pass::$variant => $name,)+
                }
            }
        }
    };
}

passes! {
    Metadata => "metadata",
    Detab => "detab",
    HashPreCodeTags => "hashPreCodeTags",
    GithubCodeBlocks => "githubCodeBlocks",
    HashHtmlBlocks => "hashHTMLBlocks",
    HashCodeTags => "hashCodeTags",
    StripLinkDefinitions => "stripLinkDefinitions",
    BlockGamut => "blockGamut",
    BlockQuotes => "blockQuotes",
    Headers => "headers",
    HorizontalRule => "horizontalRule",
    Lists => "lists",
    CodeBlocks => "codeBlocks",
    Tables => "tables",
    Paragraphs => "paragraphs",
    SpanGamut => "spanGamut",
    CodeSpans => "codeSpans",
    EscapeSpecialCharsWithinTagAttributes => "escapeSpecialCharsWithinTagAttributes",
    EncodeBackslashEscapes => "encodeBackslashEscapes",
    Images => "images",
    ImagesReference => "images.reference",
    ImagesInline => "images.inline",
    ImagesReferenceShortcut => "images.referenceShortcut",
    Links => "links",
    LinksReference => "links.reference",
    LinksInline => "links.inline",
    LinksReferenceShortcut => "links.referenceShortcut",
    LinksAngleBrackets => "links.angleBrackets",
    LinksGhMentions => "links.ghMentions",
    LinksNaked => "links.naked",
    Emoji => "emoji",
    Underline => "underline",
    ItalicsAndBold => "italicsAndBold",
    Strikethrough => "strikethrough",
    Ellipsis => "ellipsis",
    HashHtmlSpans => "hashHTMLSpans",
    EncodeAmpsAndAngles => "encodeAmpsAndAngles",
    UnhashHtmlSpans => "unhashHTMLSpans",
    UnescapeSpecialChars => "unescapeSpecialChars",
    Wrapper => "wrapper",
}

impl Pass {
    /// Look a pass up by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|pass| pass.name().eq_ignore_ascii_case(name))
    }
}

/// When, relative to its pass, an event fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before the pass runs, with its input.
    Before,
    /// After the pass ran, with its output.
    After,
    /// A link or image was matched, before it is written.
    CaptureStart,
    /// A link or image was written.
    CaptureEnd,
}

impl Phase {
    fn name(self) -> &'static str {
        match self {
            Phase::Before => "before",
            Phase::After => "after",
            Phase::CaptureStart => "captureStart",
            Phase::CaptureEnd => "captureEnd",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "before" | "start" => Some(Phase::Before),
            "after" | "end" => Some(Phase::After),
            "capturestart" => Some(Phase::CaptureStart),
            "captureend" => Some(Phase::CaptureEnd),
            _ => None,
        }
    }
}

/// A pass together with a phase, e.g. `italicsAndBold.before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stage {
    /// The pass.
    pub pass: Pass,
    /// The phase.
    pub phase: Phase,
}

impl Stage {
    /// The `before` stage of `pass`.
    pub fn before(pass: Pass) -> Self {
        Self {
            pass,
            phase: Phase::Before,
        }
    }

    /// The `after` stage of `pass`.
    pub fn after(pass: Pass) -> Self {
        Self {
            pass,
            phase: Phase::After,
        }
    }

    pub(crate) fn capture_start(pass: Pass) -> Self {
        Self {
            pass,
            phase: Phase::CaptureStart,
        }
    }

    pub(crate) fn capture_end(pass: Pass) -> Self {
        Self {
            pass,
            phase: Phase::CaptureEnd,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.pass.name(), self.phase.name())
    }
}

impl FromStr for Stage {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || ConfigurationError::UnknownStage(s.to_owned());
        let (pass, phase) = s.rsplit_once('.').ok_or_else(unknown)?;
        Ok(Self {
            pass: Pass::from_name(pass).ok_or_else(unknown)?,
            phase: Phase::from_name(phase).ok_or_else(unknown)?,
        })
    }
}

/// Match data carried by capture events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureMatch {
    /// Source text of the whole link or image.
    pub whole_match: String,
    /// Link text or alt text.
    pub text: String,
    /// Reference id, empty for inline forms.
    pub id: String,
    /// Target URL.
    pub url: String,
    /// Title, empty when absent.
    pub title: String,
}

/// The value passed to listeners.
pub struct Event<'a> {
    stage: Stage,
    text: String,
    options: &'a ConversionOptions,
    state: &'a RunState,
    matches: Option<CaptureMatch>,
    default_prevented: bool,
}

impl<'a> Event<'a> {
    pub(crate) fn new(
        stage: Stage,
        text: String,
        options: &'a ConversionOptions,
        globals: &'a RunState,
        matches: Option<CaptureMatch>,
    ) -> Self {
        Self {
            stage,
            text,
            options,
            state: globals,
            matches,
            default_prevented: false,
        }
    }

    /// The stage being dispatched.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text seen by later listeners and by the pass.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Options of the running conversion.
    pub fn options(&self) -> &ConversionOptions {
        self.options
    }

    /// State of the running conversion.
    pub fn state(&self) -> &RunState {
        self.state
    }

    /// Match data, for capture events.
    pub fn matches(&self) -> Option<&CaptureMatch> {
        self.matches.as_ref()
    }

    /// Replace the match data used to write a captured link or image.
    pub fn set_matches(&mut self, matches: CaptureMatch) {
        self.matches = Some(matches);
    }

    /// Skip the work of this stage.
    ///
    /// From a `before` listener the pass does not run and the event text is
    /// used as its output. From a `captureStart` listener the source text is
    /// kept and no link or image is written.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a listener called [`prevent_default`](Self::prevent_default).
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    pub(crate) fn finish(self) -> Dispatched {
        Dispatched {
            text: self.text,
            matches: self.matches,
            prevented: self.default_prevented,
        }
    }
}

impl fmt::Debug for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("stage", &self.stage)
            .field("text", &self.text)
            .field("matches", &self.matches)
            .field("default_prevented", &self.default_prevented)
            .finish_non_exhaustive()
    }
}

/// What listeners left behind after a dispatch.
#[derive(Debug)]
pub(crate) struct Dispatched {
    pub(crate) text: String,
    pub(crate) matches: Option<CaptureMatch>,
    pub(crate) prevented: bool,
}

/// Listener registrations, keyed by stage.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    by_stage: HashMap<Stage, Vec<Arc<ListenerFn>>>,
}

impl Listeners {
    pub(crate) fn add(&mut self, stage: Stage, listener: Arc<ListenerFn>) {
        self.by_stage.entry(stage).or_default().push(listener);
    }

    pub(crate) fn get(&self, stage: Stage) -> &[Arc<ListenerFn>] {
        self.by_stage.get(&stage).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_stage.values().map(Vec::len).sum()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stages: Vec<String> = self.by_stage.keys().map(ToString::to_string).collect();
        stages.sort();
        f.debug_struct("Listeners").field("stages", &stages).finish()
    }
}

/// Run every listener of `stage` over `text`, in registration order.
pub(crate) fn dispatch(
    listeners: &Listeners,
    stage: Stage,
    text: String,
    options: &ConversionOptions,
    globals: &RunState,
    matches: Option<CaptureMatch>,
) -> Dispatched {
    let registered = listeners.get(stage);
    if registered.is_empty() {
        return Dispatched {
            text,
            matches,
            prevented: false,
        };
    }
    let mut event = Event::new(stage, text, options, globals, matches);
    for listener in registered {
        listener(&mut event);
    }
    event.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_stage_parses_case_insensitively() {
        let stage: Stage = "ITALICSANDBOLD.Before".parse().unwrap();
        assert_eq!(stage, Stage::before(Pass::ItalicsAndBold));
        assert_eq!(stage.to_string(), "italicsAndBold.before");
    }

    #[test]
    fn test_stage_with_dotted_pass() {
        let stage: Stage = "links.inline.captureStart".parse().unwrap();
        assert_eq!(stage.pass, Pass::LinksInline);
        assert_eq!(stage.phase, Phase::CaptureStart);
    }

    #[test]
    fn test_legacy_phase_aliases() {
        assert_eq!(
            "headers.start".parse::<Stage>().unwrap(),
            Stage::before(Pass::Headers)
        );
        assert_eq!(
            "headers.end".parse::<Stage>().unwrap(),
            Stage::after(Pass::Headers)
        );
    }

    #[test]
    fn test_unknown_stage() {
        let err = "nope.before".parse::<Stage>().unwrap_err();
        assert!(matches!(err, ConfigurationError::UnknownStage(name) if name == "nope.before"));
        assert!("headers".parse::<Stage>().is_err());
        assert!("headers.during".parse::<Stage>().is_err());
    }

    #[test]
    fn test_pass_names_round_trip() {
        for pass in Pass::ALL {
            assert_eq!(Pass::from_name(pass.name()), Some(*pass));
        }
    }

    #[test]
    fn test_dispatch_chains_listener_text() {
        let mut listeners = Listeners::default();
        let stage = Stage::before(Pass::Headers);
        listeners.add(
            stage,
            Arc::new(|event: &mut Event<'_>| {
                let text = format!("{}b", event.text());
                event.set_text(text);
            }),
        );
        listeners.add(
            stage,
            Arc::new(|event: &mut Event<'_>| {
                let text = format!("{}c", event.text());
                event.set_text(text);
                event.prevent_default();
            }),
        );
        let options = ConversionOptions::default();
        let state = RunState::default();
        let out = dispatch(&listeners, stage, "a".to_owned(), &options, &state, None);
        assert_eq!(out.text, "abc");
        assert!(out.prevented);
    }

    #[test]
    fn test_dispatch_without_listeners_is_passthrough() {
        let listeners = Listeners::default();
        let options = ConversionOptions::default();
        let state = RunState::default();
        let stage = Stage::after(Pass::Tables);
        let out = dispatch(&listeners, stage, "x".to_owned(), &options, &state, None);
        assert_eq!(out.text, "x");
        assert!(!out.prevented);
    }
}
