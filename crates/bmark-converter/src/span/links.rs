//! Links: reference, inline and shortcut forms, and the shared anchor writer.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

use crate::event::{CaptureMatch, Pass, Stage};
use crate::parser::Parser;
use crate::scan::group;
use crate::sentinel::{escape_char, escape_link_chars, protect, restore, unescape_chars};

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[((?:\[[^\]]*]|[^\[\]])*)] ?(?:\n *)?\[(.*?)]").unwrap()
});
static INLINE_EMPTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[(.*?)]\(<? ?>? ?(?:["'](.*)["'])?\)"#).unwrap()
});
static INLINE_ANGLED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\[((?:\[[^\]]*]|[^\[\]])*)]\s?\([ \t]?<([^>]*)>(?:[ \t]*(?:"([^"]*?)"|'([^"]*?)'))?[ \t]?\)"#,
    )
    .unwrap()
});
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\[([\S ]*?)]\s?\( *<?([^\s'"]*?(?:\([\S]*?\)[\S]*?)?)>?\s*(?:"(.*?)"|'(.*?)')? *\)"#,
    )
    .unwrap()
});
static INLINE_PAREN_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[([\S ]*?)]\s?\( *<?([^\s'"]*?(?:\([\S]*?\)[\S]*?)?)>?\s+\((.*?)\) *\)"#)
        .unwrap()
});
static SHORTCUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\[\]]+)]").unwrap());
static RAW_ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<a\s[^>]*>[\s\S]*</a>").unwrap());
static RAW_IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img\s[^>]*/?>").unwrap());
static SOFT_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?\n").unwrap());

/// One inline link pattern and where its title is captured.
struct InlineForm {
    re: &'static LazyLock<Regex>,
    title_groups: (usize, usize),
    empty: bool,
}

static INLINE_FORMS: [InlineForm; 4] = [
    InlineForm {
        re: &INLINE_EMPTY_RE,
        title_groups: (2, 2),
        empty: true,
    },
    InlineForm {
        re: &INLINE_ANGLED_RE,
        title_groups: (3, 4),
        empty: false,
    },
    InlineForm {
        re: &INLINE_RE,
        title_groups: (3, 4),
        empty: false,
    },
    InlineForm {
        re: &INLINE_PAREN_TITLE_RE,
        title_groups: (3, 3),
        empty: false,
    },
];

/// Capture data for a link found by one of the link patterns.
pub(crate) fn capture(whole: &str, text: &str, id: &str, url: &str, title: &str) -> CaptureMatch {
    CaptureMatch {
        whole_match: whole.to_owned(),
        text: text.to_owned(),
        id: id.to_owned(),
        url: url.to_owned(),
        title: title.to_owned(),
    }
}

/// Join a relative `url` onto `base`.
///
/// Absolute URLs, protocol-relative URLs and fragment links are returned
/// unchanged, as is anything the base cannot be joined with.
pub(crate) fn resolve_relative(base: Option<&str>, url: &str) -> String {
    let Some(base) = base else {
        return url.to_owned();
    };
    let plain = restore(&unescape_chars(url));
    if plain.is_empty() || plain.starts_with('#') || plain.starts_with("//") || Url::parse(&plain).is_ok() {
        return url.to_owned();
    }
    match Url::parse(base).and_then(|base| base.join(&plain)) {
        Ok(joined) => protect(joined.as_str()),
        Err(err) => {
            tracing::debug!(base, url = %plain, error = %err, "Cannot join relative URL");
            url.to_owned()
        }
    }
}

impl Parser<'_> {
    /// Every link form, in order, followed by autolinks.
    pub(crate) fn links(&mut self, text: String) -> String {
        self.run_pass(Pass::Links, text, |p, text| {
            let text = p.reference_links(text);
            let text = p.inline_links(text);
            let text = p.shortcut_links(text);
            let text = p.angle_bracket_links(text);
            let text = p.mention_links(text);
            let state = &mut p.state;
            let text = RAW_ANCHOR_RE
                .replace_all(&text, |caps: &Captures<'_>| state.hash_span(&caps[0]))
                .into_owned();
            let text = RAW_IMG_RE
                .replace_all(&text, |caps: &Captures<'_>| state.hash_span(&caps[0]))
                .into_owned();
            p.naked_links(text)
        })
    }

    fn reference_links(&mut self, text: String) -> String {
        self.run_pass(Pass::LinksReference, text, |p, text| {
            REFERENCE_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    if caps[0].contains("\n\n") {
                        return caps[0].to_owned();
                    }
                    let found = capture(&caps[0], &caps[1], &caps[2], "", "");
                    p.write_anchor(Pass::LinksReference, found, false)
                })
                .into_owned()
        })
    }

    fn inline_links(&mut self, text: String) -> String {
        self.run_pass(Pass::LinksInline, text, |p, mut text| {
            for form in &INLINE_FORMS {
                text = form
                    .re
                    .replace_all(&text, |caps: &Captures<'_>| {
                        if caps[0].contains("\n\n") {
                            return caps[0].to_owned();
                        }
                        let title = match group(caps, form.title_groups.0) {
                            "" => group(caps, form.title_groups.1),
                            title => title,
                        };
                        let url = if form.empty {
                            String::new()
                        } else {
                            resolve_relative(
                                p.options.relative_path_base_url.as_deref(),
                                group(caps, 2),
                            )
                        };
                        let found = capture(&caps[0], &caps[1], "", &url, title);
                        p.write_anchor(Pass::LinksInline, found, form.empty)
                    })
                    .into_owned();
            }
            text
        })
    }

    fn shortcut_links(&mut self, text: String) -> String {
        self.run_pass(Pass::LinksReferenceShortcut, text, |p, text| {
            SHORTCUT_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    if caps[0].contains("\n\n") {
                        return caps[0].to_owned();
                    }
                    let found = capture(&caps[0], &caps[1], "", "", "");
                    p.write_anchor(Pass::LinksReferenceShortcut, found, false)
                })
                .into_owned()
        })
    }

    /// Write an anchor for a captured link and park it in the span store.
    ///
    /// Without an explicit URL the reference store is consulted, keyed by
    /// the id or, failing that, the link text. A link that resolves to
    /// nothing is returned as its source text.
    pub(crate) fn write_anchor(&mut self, pass: Pass, found: CaptureMatch, empty_url: bool) -> String {
        let whole = found.whole_match.clone();
        let started = self.dispatch(Stage::capture_start(pass), whole.clone(), Some(found));
        if started.prevented {
            return self.state.hash_span(&whole);
        }
        let Some(found) = started.matches else {
            return whole;
        };

        let mut url = found.url.clone();
        let mut title = found.title.clone();
        if empty_url {
            url.clear();
        } else if url.is_empty() {
            let id = if found.id.is_empty() {
                SOFT_NEWLINE_RE
                    .replace_all(&found.text.to_lowercase(), " ")
                    .into_owned()
            } else {
                found.id.to_lowercase()
            };
            let Some(reference) = self.state.reference(&id) else {
                return found.whole_match;
            };
            url.clone_from(&reference.url);
            if let Some(reference_title) = &reference.title {
                title.clone_from(reference_title);
            }
        }

        let url = escape_link_chars(&url);
        let title = if title.is_empty() {
            String::new()
        } else {
            format!(" title=\"{}\"", escape_link_chars(&title.replace('"', "&quot;")))
        };
        let target = if self.options.open_links_in_new_window && !url.starts_with('#') {
            format!(" rel=\"noopener noreferrer\" target=\"{}blank\"", escape_char('_'))
        } else {
            String::new()
        };

        let text = self.code_spans(found.text.clone());
        let text = self.emoji(text);
        let text = self.underline(text);
        let text = self.italics_and_bold(text);
        let text = self.strikethrough(text);
        let text = self.ellipsis(text);
        let text = self.hash_html_spans(text);

        let anchor = format!("<a href=\"{url}\"{title}{target}>{text}</a>");
        let ended = self.dispatch(Stage::capture_end(pass), anchor, Some(found));
        self.state.hash_span(&ended.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConversionOptions, Converter, Event};
    use pretty_assertions::assert_eq;

    fn render_with(options: ConversionOptions, text: &str) -> String {
        let options = ConversionOptions {
            container_class: None,
            ..options
        };
        Converter::new(options).unwrap().to_html(text)
    }

    fn render(text: &str) -> String {
        render_with(ConversionOptions::default(), text)
    }

    #[test]
    fn test_inline_link_with_title() {
        assert_eq!(
            render(r#"[home](http://example.com "Home *page*")"#),
            r#"<p><a href="http://example.com" title="Home *page*">home</a></p>"#
        );
    }

    #[test]
    fn test_inline_link_with_angle_brackets_and_parens() {
        assert_eq!(
            render("[cat](<./img/cat(1).png>)"),
            r#"<p><a href="./img/cat(1).png">cat</a></p>"#
        );
    }

    #[test]
    fn test_empty_link() {
        assert_eq!(render("[nothing]()"), r#"<p><a href="">nothing</a></p>"#);
    }

    #[test]
    fn test_reference_link() {
        assert_eq!(
            render("See [the docs][Docs].\n\n[docs]: http://docs.example \"Docs\"\n"),
            r#"<p>See <a href="http://docs.example" title="Docs">the docs</a>.</p>"#
        );
    }

    #[test]
    fn test_shortcut_reference() {
        assert_eq!(
            render("Go to [Example].\n\n[example]: http://example.com\n"),
            r#"<p>Go to <a href="http://example.com">Example</a>.</p>"#
        );
    }

    #[test]
    fn test_unresolved_reference_is_literal() {
        assert_eq!(render("[foo][missing]"), "<p>[foo][missing]</p>");
    }

    #[test]
    fn test_link_text_gets_emphasis() {
        assert_eq!(
            render("[**bold** link](/x)"),
            r#"<p><a href="/x"><strong>bold</strong> link</a></p>"#
        );
    }

    #[test]
    fn test_new_window() {
        let options = ConversionOptions {
            open_links_in_new_window: true,
            ..Default::default()
        };
        assert_eq!(
            render_with(options.clone(), "[a](http://a.example)"),
            r#"<p><a href="http://a.example" rel="noopener noreferrer" target="_blank">a</a></p>"#
        );
        assert_eq!(
            render_with(options, "[top](#top)"),
            r##"<p><a href="#top">top</a></p>"##
        );
    }

    #[test]
    fn test_relative_base_url() {
        let options = ConversionOptions {
            relative_path_base_url: Some("https://example.com/docs/".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            render_with(options, "[guide](guide.html) [abs](http://other.example/)"),
            r#"<p><a href="https://example.com/docs/guide.html">guide</a> <a href="http://other.example/">abs</a></p>"#
        );
    }

    #[test]
    fn test_resolve_relative_keeps_fragments() {
        assert_eq!(resolve_relative(Some("https://e.com/"), "#x"), "#x");
        assert_eq!(resolve_relative(None, "a.html"), "a.html");
    }

    #[test]
    fn test_raw_anchor_is_kept() {
        assert_eq!(
            render(r#"<a href="/x">*raw*</a>"#),
            r#"<p><a href="/x">*raw*</a></p>"#
        );
    }

    #[test]
    fn test_prevented_link_stays_literal() {
        let mut converter = Converter::new(ConversionOptions {
            container_class: None,
            ..Default::default()
        })
        .unwrap();
        converter
            .listen("links.inline.captureStart", |event: &mut Event<'_>| {
                event.prevent_default();
            })
            .unwrap();
        assert_eq!(
            converter.to_html("[a](http://b.com) and [c](/d)"),
            "<p>[a](http://b.com) and [c](/d)</p>"
        );
    }
}
