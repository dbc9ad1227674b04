//! Inline HTML: hashing raw tags into the span store and restoring them.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::event::Pass;
use crate::parser::Parser;
use crate::store::RunState;

static SELF_CLOSING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+?/>").unwrap());
static ANY_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+?>").unwrap());

impl Parser<'_> {
    /// Park inline HTML in the span store.
    ///
    /// Four sweeps, from the most specific shape to the most general:
    /// self-closing tags, elements without attributes, elements with
    /// attributes, and finally any remaining tag.
    pub(crate) fn hash_html_spans(&mut self, text: String) -> String {
        self.run_pass(Pass::HashHtmlSpans, text, |p, text| {
            let state = &mut p.state;
            let text = SELF_CLOSING_RE
                .replace_all(&text, |caps: &regex::Captures<'_>| state.hash_span(&caps[0]))
                .into_owned();
            let text = hash_elements(state, &text, element_without_attributes);
            let text = hash_elements(state, &text, element_with_attributes);
            ANY_TAG_RE
                .replace_all(&text, |caps: &regex::Captures<'_>| state.hash_span(&caps[0]))
                .into_owned()
        })
    }

    /// Substitute span markers back.
    pub(crate) fn unhash_html_spans(&mut self, text: String) -> String {
        self.run_pass(Pass::UnhashHtmlSpans, text, |p, text| p.state.unhash_spans(&text))
    }
}

/// Replace every element found by `find` with a span marker.
fn hash_elements(
    state: &mut RunState,
    text: &str,
    find: fn(&str, usize) -> Option<Range<usize>>,
) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut at = 0;
    while let Some(found) = text[at..].find('<').map(|i| at + i) {
        match find(text, found) {
            Some(element) => {
                out.push_str(&text[last..element.start]);
                out.push_str(&state.hash_span(&text[element.clone()]));
                last = element.end;
                at = element.end;
            }
            None => at = found + 1,
        }
    }
    out.push_str(&text[last..]);
    out
}

/// `<name>…</name>` starting at `start`, where `name` is everything up to
/// the first `>`.
fn element_without_attributes(text: &str, start: usize) -> Option<Range<usize>> {
    let open_end = start + text[start..].find('>')?;
    let name = &text[start + 1..open_end];
    if name.is_empty() {
        return None;
    }
    closing(text, open_end + 1, name).map(|end| start..end)
}

/// `<name attrs>…</name>` starting at `start`. The name is the shortest
/// prefix of the tag followed by whitespace and at least one more character.
fn element_with_attributes(text: &str, start: usize) -> Option<Range<usize>> {
    let open_end = start + text[start..].find('>')?;
    let tag = &text[start + 1..open_end];
    tag.char_indices()
        .filter(|&(i, c)| i > 0 && c.is_whitespace() && i + c.len_utf8() < tag.len())
        .find_map(|(i, _)| closing(text, open_end + 1, &tag[..i]))
        .map(|end| start..end)
}

/// End of the first `</name>` at or after `from`.
fn closing(text: &str, from: usize, name: &str) -> Option<usize> {
    let needle = format!("</{name}>");
    text[from..]
        .find(&needle)
        .map(|i| from + i + needle.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_element_without_attributes() {
        let text = "a <b>bold</b> c";
        assert_eq!(element_without_attributes(text, 2), Some(2..13));
    }

    #[test]
    fn test_element_with_attributes() {
        let text = r#"<span class="x">y</span>!"#;
        assert_eq!(element_with_attributes(text, 0), Some(0..24));
        assert_eq!(element_without_attributes(text, 0), None);
    }

    #[test]
    fn test_hash_elements_leaves_unclosed() {
        let mut state = RunState::default();
        let out = hash_elements(&mut state, "<i>open <b>x</b>", element_without_attributes);
        assert_eq!(out, "<i>open ¨C0C");
        assert_eq!(state.html_spans(), ["<b>x</b>"]);
    }

    #[test]
    fn test_inline_html_is_untouched() {
        let options = crate::ConversionOptions {
            container_class: None,
            ..Default::default()
        };
        let html = crate::Converter::new(options)
            .unwrap()
            .to_html(r#"say <span title="a*b*c">*hi*</span>"#);
        assert_eq!(html, r#"<p>say <span title="a*b*c"><em>hi</em></span></p>"#);
    }
}
