//! The conversion pipeline.
//!
//! A [`Parser`] owns the [`RunState`] of one conversion and borrows the
//! converter it runs for. Every grammar pass is a method on it (the block
//! passes live in [`crate::block`], the inline passes in [`crate::span`]),
//! and every pass goes through [`Parser::run_pass`] so listeners see it.

use std::sync::LazyLock;

use regex::Regex;

use crate::converter::Converter;
use crate::event::{self, CaptureMatch, Dispatched, Pass, Stage};
use crate::options::ConversionOptions;
use crate::sentinel::{protect, restore, unescape_chars};
use crate::store::RunState;
use crate::text;

static WHITESPACE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]+$").unwrap());
static CODE_BLOCK_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n*¨G(\d+)G\n*").unwrap());

pub(crate) struct Parser<'c> {
    pub(crate) converter: &'c Converter,
    pub(crate) options: &'c ConversionOptions,
    pub(crate) state: RunState,
    /// Block constructs currently being parsed inside one another.
    nesting: usize,
}

impl<'c> Parser<'c> {
    pub(crate) fn new(converter: &'c Converter, nesting: usize) -> Self {
        Self {
            converter,
            options: converter.options(),
            state: RunState::default(),
            nesting,
        }
    }

    /// Fire `stage` at the registered listeners.
    pub(crate) fn dispatch(
        &self,
        stage: Stage,
        text: String,
        matches: Option<CaptureMatch>,
    ) -> Dispatched {
        event::dispatch(
            self.converter.listeners(),
            stage,
            text,
            self.options,
            &self.state,
            matches,
        )
    }

    /// Run `pass` between its `before` and `after` events.
    ///
    /// A `before` listener that prevents default replaces the pass: its
    /// text goes straight to the `after` event.
    pub(crate) fn run_pass<F>(&mut self, pass: Pass, text: String, f: F) -> String
    where
        F: FnOnce(&mut Self, String) -> String,
    {
        let before = self.dispatch(Stage::before(pass), text, None);
        let text = if before.prevented {
            before.text
        } else {
            f(self, before.text)
        };
        self.dispatch(Stage::after(pass), text, None).text
    }

    /// Run `f` one nesting level deeper.
    ///
    /// Returns `None` without calling `f` once `max_nesting_depth` is
    /// reached; the caller then leaves the construct unparsed.
    pub(crate) fn nested<F>(&mut self, pass: Pass, f: F) -> Option<String>
    where
        F: FnOnce(&mut Self) -> String,
    {
        if let Some(limit) = self.options.max_nesting_depth
            && self.nesting >= limit
        {
            tracing::warn!(pass = pass.name(), limit, "Maximum nesting depth reached");
            return None;
        }
        self.nesting += 1;
        let out = f(self);
        self.nesting -= 1;
        Some(out)
    }

    /// Convert the contents of an HTML block marked with a `markdown`
    /// attribute, in a fresh run one level deeper.
    pub(crate) fn convert_fragment(&self, text: &str) -> String {
        if self
            .options
            .max_nesting_depth
            .is_some_and(|limit| self.nesting >= limit)
        {
            tracing::warn!(
                pass = Pass::HashHtmlBlocks.name(),
                "Maximum nesting depth reached, keeping HTML block contents as written"
            );
            return text.to_owned();
        }
        // Fenced blocks inside the element were already parked in this run.
        let source = CODE_BLOCK_MARKER_RE.replace_all(text, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| self.state.code_blocks.get(i))
                .map_or_else(
                    || caps[0].to_owned(),
                    |entry| format!("\n{}\n", entry.original.trim_matches('\n')),
                )
        });
        // The fragment was protected with the rest of the document, and its
        // output is parked in this run, so it is protected again.
        let source = restore(&source);
        protect(&Parser::new(self.converter, self.nesting + 1).make_html(&source, false))
    }

    /// Convert a whole document.
    ///
    /// With `wrap`, the result is placed in the container `<div>` when a
    /// container class is configured.
    pub(crate) fn make_html(&mut self, source: &str, wrap: bool) -> String {
        if source.is_empty() {
            return String::new();
        }
        let options = self.options;
        let converter = self.converter;

        let mut text = protect(source)
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\u{a0}', "&nbsp;");
        if options.smart_indentation_fix {
            text = text::strip_common_indentation(&text);
        }
        let text = format!("\n\n{text}\n\n");
        let text = self.run_pass(Pass::Detab, text, |_, t| text::detab(&t));
        let mut text = WHITESPACE_LINE_RE.replace_all(&text, "").into_owned();

        for extension in converter.lang_extensions() {
            text = extension.apply(&text, converter, options);
        }

        let text = self.metadata(text);
        let text = self.hash_pre_code_tags(text);
        let text = self.github_code_blocks(text);
        let text = self.hash_html_blocks(text);
        let text = self.hash_code_tags(text);
        let text = self.strip_link_definitions(text);
        let text = self.block_gamut(text);
        let text = self.unhash_html_spans(text);
        let text = self.run_pass(Pass::UnescapeSpecialChars, text, |_, t| unescape_chars(&t));
        let mut text = restore(&text);

        if wrap && let Some(class) = &options.container_class {
            text = self.run_pass(Pass::Wrapper, text, |_, t| {
                format!("<div {}=\"{class}\">\n{t}\n</div>", options.class_attr())
            });
        }

        for extension in converter.output_extensions() {
            text = extension.apply(&text, converter, options);
        }
        text
    }

    /// Finish the run, handing back its state.
    pub(crate) fn into_state(self) -> RunState {
        self.state
    }
}
