//! Images: `![alt](src "title" =WxH)`, `![alt][id]` and `![alt]`.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::links::{capture, resolve_relative};
use crate::event::{CaptureMatch, Pass, Stage};
use crate::parser::Parser;
use crate::scan::group;
use crate::sentinel::escape_link_chars;
use crate::store::Dimensions;

static REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*?)] ?(?:\n *)?\[([\s\S]*?)]").unwrap());
static BASE64_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!\[([^\]]*?)][ \t]*\([ \t]?<?(data:.+?/.+?;base64,[A-Za-z0-9+/=\n]+?)>?(?: =([*\d]+[A-Za-z%]{0,4})x([*\d]+[A-Za-z%]{0,4}))?[ \t]*(?:"([^"]*?)"|'([^"]*?)')?[ \t]?\)"#,
    )
    .unwrap()
});
static ANGLED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!\[([^\]]*?)][ \t]*\([ \t]?<([^>]*)>(?: =([*\d]+[A-Za-z%]{0,4})x([*\d]+[A-Za-z%]{0,4}))?[ \t]*(?:"([^"]*?)"|'([^"]*?)')?[ \t]?\)"#,
    )
    .unwrap()
});
static INLINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"!\[([^\]]*?)][ \t]*\([ \t]?<?([\S]+?(?:\([\S]*?\)[\S]*?)?)>?(?: =([*\d]+[A-Za-z%]{0,4})x([*\d]+[A-Za-z%]{0,4}))?[ \t]*(?:"([^"]*?)"|'([^"]*?)')?[ \t]?\)"#,
    )
    .unwrap()
});
static SHORTCUT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\[\]]+)]").unwrap());
static EXPLICIT_EMPTY_SRC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)\(<?\s*>? ?(['"].*['"])?\)$"#).unwrap());
static SOFT_NEWLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" ?\n").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

impl Parser<'_> {
    /// Every image form, in order.
    pub(crate) fn images(&mut self, text: String) -> String {
        self.run_pass(Pass::Images, text, |p, text| {
            let text = p.run_pass(Pass::ImagesReference, text, |p, text| {
                REFERENCE_RE
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let found = capture(&caps[0], &caps[1], &caps[2], "", "");
                        p.write_image(Pass::ImagesReference, found, None)
                    })
                    .into_owned()
            });
            let text = p.run_pass(Pass::ImagesInline, text, |p, text| {
                let text = BASE64_RE
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let src = WHITESPACE_RE.replace_all(&caps[2], "").into_owned();
                        p.inline_image(caps, src)
                    })
                    .into_owned();
                let text = ANGLED_RE
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let src = resolve_relative(
                            p.options.relative_path_base_url.as_deref(),
                            &caps[2],
                        );
                        p.inline_image(caps, src)
                    })
                    .into_owned();
                INLINE_RE
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let src = resolve_relative(
                            p.options.relative_path_base_url.as_deref(),
                            &caps[2],
                        );
                        p.inline_image(caps, src)
                    })
                    .into_owned()
            });
            p.run_pass(Pass::ImagesReferenceShortcut, text, |p, text| {
                SHORTCUT_RE
                    .replace_all(&text, |caps: &Captures<'_>| {
                        let found = capture(&caps[0], &caps[1], "", "", "");
                        p.write_image(Pass::ImagesReferenceShortcut, found, None)
                    })
                    .into_owned()
            })
        })
    }

    fn inline_image(&mut self, caps: &Captures<'_>, src: String) -> String {
        let title = match group(caps, 5) {
            "" => group(caps, 6),
            title => title,
        };
        let dimensions = caps.get(3).zip(caps.get(4)).map(|(w, h)| Dimensions {
            width: w.as_str().to_owned(),
            height: h.as_str().to_owned(),
        });
        let found = capture(&caps[0], &caps[1], "", &src, title);
        self.write_image(Pass::ImagesInline, found, dimensions)
    }

    /// Write an `<img>` tag for a captured image and park it in the span store.
    fn write_image(&mut self, pass: Pass, found: CaptureMatch, dimensions: Option<Dimensions>) -> String {
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
        let mut dimensions = dimensions;
        if EXPLICIT_EMPTY_SRC_RE.is_match(&found.whole_match) {
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
            if reference.dimensions.is_some() {
                dimensions.clone_from(&reference.dimensions);
            }
        }

        let alt = escape_link_chars(&found.text.replace('"', "&quot;"));
        let mut tag = format!("<img src=\"{}\" alt=\"{alt}\"", escape_link_chars(&url));
        if !title.is_empty() {
            let title = escape_link_chars(&title.replace('"', "&quot;"));
            let _ = write!(tag, " title=\"{title}\"");
        }
        if let Some(Dimensions { width, height }) = dimensions {
            let _ = write!(
                tag,
                " width=\"{}\" height=\"{}\"",
                dimension(&width),
                dimension(&height)
            );
        }
        tag.push_str(" />");

        let ended = self.dispatch(Stage::capture_end(pass), tag, Some(found));
        self.state.hash_span(&ended.text)
    }
}

/// `*` stands for an automatic size.
fn dimension(value: &str) -> &str {
    if value == "*" { "auto" } else { value }
}
