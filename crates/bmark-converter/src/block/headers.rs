//! Setext and atx headers, and the ids generated for them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::options::HeaderIdStyle;
use crate::parser::Parser;
use crate::sentinel::{protect, restore};

static SETEXT_H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+)[ \t]*\n=+[ \t]*\n+").unwrap());
static SETEXT_H1_SMOOTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+)[ \t]*\n={2,}[ \t]*\n+").unwrap());
static SETEXT_H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+)[ \t]*\n-+[ \t]*\n+").unwrap());
static SETEXT_H2_SMOOTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(.+)[ \t]*\n-{2,}[ \t]*\n+").unwrap());
static ATX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]*(.+?)[ \t]*#*\n+").unwrap());
static ATX_SPACED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)[ \t]*#*\n+").unwrap());
static CUSTOM_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s?\{([^{]+?)\}\s*$").unwrap());
static NON_WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").unwrap());
static GITHUB_PUNCTUATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r##"[&+$,/:;=?@"#{}|^¨~\[\]`\\*)(%.!'<>]"##).unwrap());
static RAW_DASHED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[ "'<>]"#).unwrap());

impl Parser<'_> {
    /// `Title\n===`, `Title\n---` and `# Title #` headers.
    pub(crate) fn headers(&mut self, text: String) -> String {
        self.run_pass(Pass::Headers, text, |p, text| {
            let smooth = p.options.smooth_live_preview;
            let h1: &Regex = if smooth { &SETEXT_H1_SMOOTH_RE } else { &SETEXT_H1_RE };
            let h2: &Regex = if smooth { &SETEXT_H2_SMOOTH_RE } else { &SETEXT_H2_RE };

            let text = h1
                .replace_all(&text, |caps: &Captures<'_>| p.write_header(1, &caps[1], &caps[1]))
                .into_owned();
            let text = h2
                .replace_all(&text, |caps: &Captures<'_>| p.write_header(2, &caps[1], &caps[1]))
                .into_owned();

            let atx: &Regex = if p.options.require_space_before_heading_text {
                &ATX_SPACED_RE
            } else {
                &ATX_RE
            };
            atx.replace_all(&text, |caps: &Captures<'_>| {
                let raw = &caps[2];
                let shown = if p.options.customized_header_id {
                    CUSTOM_ID_RE.replace(raw, "").into_owned()
                } else {
                    raw.to_owned()
                };
                p.write_header(caps[1].len(), &shown, raw)
            })
            .into_owned()
        })
    }

    fn write_header(&mut self, hashes: usize, shown: &str, id_source: &str) -> String {
        let level = self.options.header_level(hashes);
        let span = self.span_gamut(shown.to_owned());
        let header = if self.options.no_header_id {
            format!("<h{level}>{span}</h{level}>")
        } else {
            let id = self.header_id(id_source);
            format!("<h{level} id=\"{id}\">{span}</h{level}>")
        };
        self.state.hash_block(&header)
    }

    /// Id for a header, unique within the document.
    pub(crate) fn header_id(&mut self, text: &str) -> String {
        let mut title = restore(text);
        if self.options.customized_header_id
            && let Some(caps) = CUSTOM_ID_RE.captures(&title)
        {
            title = caps[1].to_owned();
        }

        let prefix = self.options.prefix_header_id.as_deref().unwrap_or("");
        if !self.options.raw_prefix_header_id {
            title = format!("{prefix}{title}");
        }
        let mut id = match self.options.header_id_style {
            HeaderIdStyle::Classic => NON_WORD_RE.replace_all(&title, "").to_lowercase(),
            HeaderIdStyle::GithubCompatible => {
                let dashed = title.replace(' ', "-").replace("&amp;", "");
                GITHUB_PUNCTUATION_RE
                    .replace_all(&dashed, "")
                    .to_lowercase()
            }
            HeaderIdStyle::Raw => {
                let title = title.replace("&amp;", "&");
                RAW_DASHED_RE.replace_all(&title, "-").to_lowercase()
            }
        };
        if self.options.raw_prefix_header_id {
            id = format!("{prefix}{id}");
        }

        let id = match self.state.header_id_counts.get_mut(&id) {
            Some(count) => {
                let numbered = format!("{id}-{count}");
                *count += 1;
                numbered
            }
            None => {
                self.state.header_id_counts.insert(id.clone(), 1);
                id
            }
        };
        protect(&id)
    }
}
