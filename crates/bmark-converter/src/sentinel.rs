//! Out-of-band markers embedded in the working text.
//!
//! Every marker starts with `¨` (U+00A8). Input text is pre-escaped before
//! any pass runs, so a marker can only come from the engine itself:
//!
//! | marker      | meaning                                   |
//! |-------------|-------------------------------------------|
//! | `¨T`        | a literal `¨` from the input              |
//! | `¨D`        | a literal `$` from the input              |
//! | `¨E<n>E`    | character with code point `n`, escaped    |
//! | `¨K<n>K`    | block placeholder `n`                     |
//! | `¨C<n>C`    | span placeholder `n`                      |
//! | `¨G<n>G`    | fenced code block placeholder `n`         |
//! | `¨A`        | list marker guard inside a list item      |
//! | `¨0`        | end-of-text anchor used by some passes    |

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

/// Leading character of every marker.
pub const MARKER: char = '¨';

/// End-of-text anchor appended by passes that need to see the end.
pub(crate) const END: &str = "¨0";

/// Guard placed in front of list markers nested directly inside an item.
pub(crate) const LIST_GUARD: &str = "¨A";

static ESCAPED_CHAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"¨E(\d+)E").unwrap());

/// Make the input safe to carry markers: `¨` becomes `¨T`, `$` becomes `¨D`.
pub(crate) fn protect(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            MARKER => out.push_str("¨T"),
            '$' => out.push_str("¨D"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`protect`].
pub(crate) fn restore(text: &str) -> String {
    text.replace("¨D", "$").replace("¨T", "¨")
}

/// Marker for a single escaped character.
pub(crate) fn escape_char(c: char) -> String {
    format!("¨E{}E", u32::from(c))
}

/// Escape every character of `text` that appears in `chars`.
pub(crate) fn escape_chars(text: &str, chars: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if chars.contains(c) {
            let _ = write!(out, "¨E{}E", u32::from(c));
        } else {
            out.push(c);
        }
    }
    out
}

/// Turn `¨E<n>E` markers back into their characters.
pub(crate) fn unescape_chars(text: &str) -> String {
    ESCAPED_CHAR_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[1]
                .parse::<u32>()
                .ok()
                .and_then(char::from_u32)
                .map_or_else(|| caps[0].to_owned(), String::from)
        })
        .into_owned()
}

/// Escape `*`, `_`, `:` and `~` so emphasis and autolink passes skip them.
pub(crate) fn escape_link_chars(text: &str) -> String {
    escape_chars(text, "*_:~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protect_and_restore() {
        let text = "costs $5 ¨ or more";
        let protected = protect(text);
        assert!(!protected.contains('$'));
        assert_eq!(protected, "costs ¨D5 ¨T or more");
        assert_eq!(restore(&protected), text);
    }

    #[test]
    fn test_escape_round_trip() {
        let text = "plain *text* with_underscores";
        let escaped = escape_chars(text, "*_");
        assert!(!escaped.contains('*'));
        assert!(!escaped.contains('_'));
        assert_eq!(unescape_chars(&escaped), text);
    }

    #[test]
    fn test_escape_char_uses_code_point() {
        assert_eq!(escape_char('*'), "¨E42E");
        assert_eq!(escape_char('\\'), "¨E92E");
    }

    #[test]
    fn test_unescape_leaves_invalid_code_points() {
        assert_eq!(unescape_chars("¨E55296E"), "¨E55296E");
    }
}
