//! Inline grammar.
//!
//! [`Parser::span_gamut`] runs the inline passes in a fixed order over the
//! text of one block. Finished inline markup is parked in the span store so
//! that later passes never see its syntax again.

mod autolink;
mod code;
mod emoji;
mod emphasis;
mod html;
mod images;
mod links;

pub(crate) use links::resolve_relative;

use std::sync::LazyLock;

use regex::Regex;

use crate::event::Pass;
use crate::parser::Parser;
use crate::text;

static TRAILING_SPACES_BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}\n").unwrap());
static NEWLINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n+").unwrap());

impl Parser<'_> {
    /// Run every inline pass over `text`.
    pub(crate) fn span_gamut(&mut self, text: String) -> String {
        self.run_pass(Pass::SpanGamut, text, |p, text| {
            let text = p.code_spans(text);
            let text = p.run_pass(Pass::EscapeSpecialCharsWithinTagAttributes, text, |_, t| {
                text::escape_special_chars_within_tag_attributes(&t)
            });
            let text = p.run_pass(Pass::EncodeBackslashEscapes, text, |_, t| {
                text::encode_backslash_escapes(&t)
            });
            let text = p.images(text);
            let text = p.links(text);
            let text = p.emoji(text);
            let text = p.underline(text);
            let text = p.italics_and_bold(text);
            let text = p.strikethrough(text);
            let text = p.ellipsis(text);
            let text = p.hash_html_spans(text);
            let text = p.run_pass(Pass::EncodeAmpsAndAngles, text, |_, t| {
                text::encode_amps_and_angles(&t)
            });
            p.hard_breaks(&text)
        })
    }

    fn hard_breaks(&self, text: &str) -> String {
        if self.options.simple_line_breaks {
            // A block marker means list content; breaking it would split the list.
            if text.contains("\n\n¨K") {
                text.to_owned()
            } else {
                NEWLINES_RE.replace_all(text, "<br />\n").into_owned()
            }
        } else {
            TRAILING_SPACES_BREAK_RE
                .replace_all(text, "<br />\n")
                .into_owned()
        }
    }
}
