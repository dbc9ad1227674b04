//! Character-level text helpers shared by the grammar passes.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::scan;
use crate::sentinel::{escape_char, escape_chars};

static OUTDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(?:\t|[ ]{1,4})").unwrap());
static ENTITY_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?[xX]?(?:[0-9a-fA-F]+|[0-9A-Za-z_]+);").unwrap());
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?[a-z\d_:-]+(?:\s+[\s\S]+?)?>").unwrap());
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!(--(?:(?:[^>-]|-[^>])(?:[^-]|-[^-])*)--)>").unwrap());
static CODE_TAG_IN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(.)</?code>(?P<ahead>.)").unwrap());

/// Characters escaped inside code.
const CODE_CHARS: &str = "*_{}[]\\=~-";
/// Characters escaped inside tags and comments.
const TAG_CHARS: &str = "\\`*_~=|";
/// Characters a backslash can escape.
const BACKSLASH_ESCAPABLE: &str = "`*_{}[]()>#+.!~=|:-";

/// Expand tabs to spaces.
///
/// Within a run of tabs every tab but the last becomes four spaces. The last
/// tab pads the text since the previous tab on the same line to a multiple
/// of four; the first tab of a line always becomes four spaces.
pub(crate) fn detab(text: &str) -> String {
    if !text.contains('\t') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len() + 16);
    let mut since_tab: Option<usize> = None;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => {
                out.push('\n');
                since_tab = None;
            }
            '\t' if chars.peek() == Some(&'\t') => {
                out.push_str("    ");
                since_tab = since_tab.map(|n| n + 4);
            }
            '\t' => {
                let pad = match since_tab {
                    Some(n) if n > 0 => 4 - n % 4,
                    _ => 4,
                };
                out.extend(std::iter::repeat_n(' ', pad));
                since_tab = Some(0);
            }
            _ => {
                out.push(c);
                since_tab = since_tab.map(|n| n + 1);
            }
        }
    }
    out
}

/// Remove one level of indentation (a tab or up to four spaces) per line.
pub(crate) fn outdent(text: &str) -> String {
    OUTDENT_RE.replace_all(text, "").into_owned()
}

/// Encode text that must appear literally inside `<code>`.
pub(crate) fn encode_code(text: &str) -> String {
    let encoded = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;");
    escape_chars(&encoded, CODE_CHARS)
}

/// Encode `&` unless it starts an entity, and every `<` and `>`.
pub(crate) fn encode_amps_and_angles(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '&' if !ENTITY_TAIL_RE.is_match(&text[i + 1..]) => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Turn `\\` and `\X` for Markdown punctuation into escape markers.
pub(crate) fn encode_backslash_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next == '\\' || BACKSLASH_ESCAPABLE.contains(next) => {
                    out.push_str(&escape_char(next));
                    chars.next();
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    out
}

/// Escape Markdown punctuation inside HTML tags and comments.
///
/// Attribute values such as `title="a_b_c"` must not be read as emphasis.
/// A `<code>` tag nested inside another tag degrades to a backtick.
pub(crate) fn escape_special_chars_within_tag_attributes(text: &str) -> String {
    let text = TAG_RE.replace_all(text, |caps: &Captures<'_>| {
        let tag = scan::replace_ahead(&CODE_TAG_IN_TAG_RE, &caps[0], |inner| {
            format!("{}`", scan::group(inner, 1))
        });
        escape_chars(&tag, TAG_CHARS)
    });
    COMMENT_RE
        .replace_all(&text, |caps: &Captures<'_>| escape_chars(&caps[0], TAG_CHARS))
        .into_owned()
}

/// Leading indentation of the first non-blank line, stripped from every line.
pub(crate) fn strip_common_indentation(text: &str) -> String {
    let indent = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .map_or(0, |line| {
            line.chars().take_while(|c| matches!(c, ' ' | '\t')).count()
        });
    if indent == 0 {
        return text.to_owned();
    }
    text.split('\n')
        .map(|line| {
            let strip = line
                .chars()
                .take(indent)
                .take_while(|c| matches!(c, ' ' | '\t'))
                .count();
            &line[strip..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}
