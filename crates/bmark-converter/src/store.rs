//! Per-conversion state and the placeholder store.
//!
//! A [`RunState`] lives for exactly one conversion. Passes that finish a
//! piece of markup park it here and leave a short marker in the text, so
//! later passes never read it as Markdown. Markers are substituted back at
//! the end: spans by [`RunState::unhash_spans`], blocks while paragraphs are
//! formed by [`RunState::unhash_blocks`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::text::encode_code;

/// Nesting depth at which span substitution stops.
const SPAN_NESTING_LIMIT: usize = 10;

static SPAN_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"¨C(\d+)C").unwrap());
static BLOCK_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"¨(?:K(\d+)K|G(\d+)G)").unwrap());
static BLOCK_MARKER_WITH_BLANKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\n\n)?¨(?:K\d+K|G\d+G)(?:\n\n)?").unwrap());
static PRE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<pre\b[^>]*>\s*<code\b[^>]*>").unwrap());

/// A fenced or pre-existing `<pre><code>` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlockEntry {
    /// Source text the block was recognized from.
    pub original: String,
    /// Rendered `<pre><code>` markup.
    pub rendered: String,
}

/// Image size from `=WxH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimensions {
    /// Width, `*` meaning automatic.
    pub width: String,
    /// Height, `*` meaning automatic.
    pub height: String,
}

/// A link reference definition: `[id]: url "title"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkReference {
    /// Resolved target.
    pub url: String,
    /// Optional title.
    pub title: Option<String>,
    /// Optional image dimensions.
    pub dimensions: Option<Dimensions>,
}

/// Metadata block parsed from the top of the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    /// Block text exactly as written.
    pub raw: String,
    /// `key: value` pairs in document order.
    pub parsed: Vec<(String, String)>,
    /// Format word after the opening fence, if any.
    pub format: Option<String>,
}

impl Metadata {
    /// Value stored for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.parsed
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether no metadata block was found.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty() && self.parsed.is_empty()
    }

    pub(crate) fn insert(&mut self, key: String, value: String) {
        if let Some(slot) = self.parsed.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.parsed.push((key, value));
        }
    }
}

/// Mutable state of one conversion.
#[derive(Debug, Default)]
pub struct RunState {
    pub(crate) html_blocks: Vec<String>,
    pub(crate) html_spans: Vec<String>,
    pub(crate) code_blocks: Vec<CodeBlockEntry>,
    pub(crate) references: HashMap<String, LinkReference>,
    pub(crate) list_level: usize,
    pub(crate) header_id_counts: HashMap<String, usize>,
    pub(crate) metadata: Metadata,
}

impl RunState {
    /// Hashed block-level fragments.
    pub fn html_blocks(&self) -> &[String] {
        &self.html_blocks
    }

    /// Hashed span-level fragments.
    pub fn html_spans(&self) -> &[String] {
        &self.html_spans
    }

    /// Code blocks recognized so far.
    pub fn code_blocks(&self) -> &[CodeBlockEntry] {
        &self.code_blocks
    }

    /// Reference definition for a (case-insensitive) id.
    pub fn reference(&self, id: &str) -> Option<&LinkReference> {
        self.references.get(&id.to_lowercase())
    }

    /// Current list nesting depth.
    pub fn list_level(&self) -> usize {
        self.list_level
    }

    /// Metadata parsed so far.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Park a block and return its marker, wrapped in blank lines.
    pub fn hash_block(&mut self, text: &str) -> String {
        let index = self.html_blocks.len();
        self.html_blocks.push(text.trim_matches('\n').to_owned());
        format!("\n\n¨K{index}K\n\n")
    }

    /// Park a raw HTML element found in the source.
    ///
    /// Blank lines inside the element are collapsed so the marker survives
    /// paragraph splitting as one chunk.
    pub(crate) fn hash_element(&mut self, text: &str) -> String {
        let collapsed = text.replace("\n\n", "\n");
        let trimmed = collapsed.strip_prefix('\n').unwrap_or(&collapsed);
        self.hash_block(trimmed.trim_end_matches('\n'))
    }

    /// Park an inline fragment and return its marker.
    pub fn hash_span(&mut self, text: &str) -> String {
        let index = self.html_spans.len();
        self.html_spans.push(text.to_owned());
        format!("¨C{index}C")
    }

    /// Park a code block and return its marker.
    pub(crate) fn hash_code_block(&mut self, original: &str, rendered: String) -> String {
        let index = self.code_blocks.len();
        self.code_blocks.push(CodeBlockEntry {
            original: original.to_owned(),
            rendered,
        });
        format!("\n\n¨G{index}G\n\n")
    }

    /// Substitute every span marker, resolving nested markers.
    ///
    /// Nesting deeper than ten levels is logged and the innermost marker
    /// stays in the output.
    pub fn unhash_spans(&self, text: &str) -> String {
        self.resolve_spans(text, 0)
    }

    fn resolve_spans(&self, text: &str, depth: usize) -> String {
        SPAN_MARKER_RE
            .replace_all(text, |caps: &Captures<'_>| {
                let span = caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.html_spans.get(index));
                match span {
                    Some(_) if depth > SPAN_NESTING_LIMIT => {
                        tracing::warn!(
                            limit = SPAN_NESTING_LIMIT,
                            "Maximum span nesting reached, leaving placeholder unresolved"
                        );
                        caps[0].to_owned()
                    }
                    Some(span) => self.resolve_spans(span, depth + 1),
                    None => caps[0].to_owned(),
                }
            })
            .into_owned()
    }

    /// Substitute the block markers of one paragraph chunk.
    ///
    /// Markers are resolved outside-in until none are left. Once the chunk
    /// opens with `<pre><code>`, further fenced markers are re-encoded from
    /// their source text: they were found inside code, not in the document.
    pub fn unhash_blocks(&self, chunk: &str) -> String {
        let mut chunk = chunk.to_owned();
        let mut in_code = false;
        let budget = (self.html_blocks.len() + self.code_blocks.len()) * 2 + 1;
        for _ in 0..budget {
            let Some(caps) = BLOCK_MARKER_RE.captures(&chunk) else {
                return chunk;
            };
            let block = if let Some(k) = caps.get(1) {
                k.as_str()
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| self.html_blocks.get(i))
                    .cloned()
            } else {
                caps.get(2)
                    .and_then(|g| g.as_str().parse::<usize>().ok())
                    .and_then(|i| self.code_blocks.get(i))
                    .map(|entry| {
                        if in_code {
                            encode_code(&entry.original)
                        } else {
                            entry.rendered.clone()
                        }
                    })
            };
            let block = block.unwrap_or_default().replace('$', "$$");
            chunk = BLOCK_MARKER_WITH_BLANKS_RE
                .replace(&chunk, block.as_str())
                .into_owned();
            if PRE_CODE_RE.is_match(&chunk) {
                in_code = true;
            }
        }
        tracing::warn!("Block placeholders did not settle, leaving them unresolved");
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_hash_block_wraps_in_blank_lines() {
        let mut state = RunState::default();
        let marker = state.hash_block("\n<hr />\n");
        assert_eq!(marker, "\n\n¨K0K\n\n");
        assert_eq!(state.html_blocks(), ["<hr />"]);
    }

    #[test]
    fn test_block_round_trip() {
        let mut state = RunState::default();
        let text = "<div>costs $5</div>";
        let marker = state.hash_block(text);
        assert_eq!(state.unhash_blocks(&marker), text);
    }

    #[test]
    fn test_nested_block_markers_resolve() {
        let mut state = RunState::default();
        let inner = state.hash_block("<p>inner</p>");
        let outer = state.hash_block(&format!("<div>{}</div>", inner.trim()));
        assert_eq!(state.unhash_blocks(&outer), "<div><p>inner</p></div>");
    }

    #[test]
    fn test_hash_element_collapses_blank_lines() {
        let mut state = RunState::default();
        state.hash_element("\n<div>\n\na</div>\n\n");
        assert_eq!(state.html_blocks(), ["<div>\na</div>"]);
    }

    #[test]
    fn test_span_round_trip_with_nesting() {
        let mut state = RunState::default();
        let inner = state.hash_span("<code>x</code>");
        let outer = state.hash_span(&format!("<a href=\"#\">{inner}</a>"));
        assert_eq!(
            state.unhash_spans(&format!("see {outer}")),
            "see <a href=\"#\"><code>x</code></a>"
        );
    }

    #[test]
    fn test_span_nesting_limit_leaves_marker() {
        let mut state = RunState::default();
        // Span 0 refers to itself, so it can never fully resolve.
        state.html_spans.push("<b>¨C0C</b>".to_owned());
        let out = state.unhash_spans("¨C0C");
        assert!(out.contains("¨C0C"));
        assert!(out.starts_with("<b><b>"));
    }

    #[test]
    fn test_span_markers_resolve_in_any_order() {
        let mut state = RunState::default();
        state.html_spans.push("<i>¨C1C</i>".to_owned());
        state.html_spans.push("x".to_owned());
        assert_eq!(
            state.unhash_spans("¨C1C ¨C9C ¨C0C ¨C1C"),
            "x ¨C9C <i>x</i> x"
        );
    }

    #[test]
    fn test_code_block_reencoded_inside_code() {
        let mut state = RunState::default();
        state.html_blocks.push("<pre><code>x</code></pre>".to_owned());
        state.code_blocks.push(CodeBlockEntry {
            original: "<b>".to_owned(),
            rendered: "<pre><code>live</code></pre>".to_owned(),
        });
        let out = state.unhash_blocks("¨K0K ¨G0G");
        assert_eq!(out, "<pre><code>x</code></pre> &lt;b&gt;");
    }

    #[test]
    fn test_metadata_insert_overwrites() {
        let mut metadata = Metadata::default();
        metadata.insert("title".to_owned(), "a".to_owned());
        metadata.insert("title".to_owned(), "b".to_owned());
        assert_eq!(metadata.get("title"), Some("b"));
        assert_eq!(metadata.parsed.len(), 1);
    }
}
