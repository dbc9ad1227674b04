//! Raw HTML blocks.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::balanced::Delimiters;
use crate::event::Pass;
use crate::parser::Parser;
use crate::scan;

/// Elements that start an HTML block when they open a line.
const BLOCK_TAGS: &[&str] = &[
    "pre", "div", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "table", "dl", "ol", "ul",
    "script", "noscript", "form", "fieldset", "iframe", "math", "style", "section", "header",
    "footer", "nav", "article", "aside", "address", "audio", "canvas", "figure", "hgroup",
    "output", "video", "details", "p",
];

struct BlockTag {
    opening: Regex,
    element: Delimiters,
}

static BLOCK_TAG_RULES: LazyLock<Vec<BlockTag>> = LazyLock::new(|| {
    BLOCK_TAGS
        .iter()
        .map(|tag| BlockTag {
            opening: Regex::new(&format!(r"(?im)^ {{0,3}}<{tag}\b[^>]*>")).unwrap(),
            element: Delimiters::new(&format!(r"<{tag}\b[^>]*>"), &format!("</{tag}>"), "im")
                .unwrap(),
        })
        .collect()
});
static COMMENT: LazyLock<Delimiters> =
    LazyLock::new(|| Delimiters::new(r"^ {0,3}<!--", "-->", "gm").unwrap());
static ESCAPED_TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\<(/?[^>]+?)>").unwrap());
static MARKDOWN_ATTR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bmarkdown\b").unwrap());
static HR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\n {0,3}<hr\b[^<>]*?/?>[ \t]*)(?P<ahead>\n{2,})").unwrap()
});
static PROCESSING_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"\n\n( {0,3}<\?[^\r]*?\?>[ \t]*)(?P<ahead>\n{2,})").unwrap(),
        Regex::new(r"\n\n( {0,3}<%[^\r]*?%>[ \t]*)(?P<ahead>\n{2,})").unwrap(),
    ]
});

impl Parser<'_> {
    /// Park raw HTML blocks so no Markdown pass reads inside them.
    ///
    /// Elements whose opening tag carries a `markdown` attribute have their
    /// contents converted first.
    pub(crate) fn hash_html_blocks(&mut self, text: String) -> String {
        self.run_pass(Pass::HashHtmlBlocks, text, |p, mut text| {
            if p.options.backslash_escapes_html_tags {
                text = ESCAPED_TAG_RE.replace_all(&text, "&lt;$1&gt;").into_owned();
            }

            for rule in BLOCK_TAG_RULES.iter() {
                while let Some(start) = rule.opening.find(&text).as_ref().map(regex::Match::start) {
                    let (head, tail) = text.split_at(start);
                    let replaced = rule.element.replace(tail, |whole, inner, left, right| {
                        let block = if MARKDOWN_ATTR_RE.is_match(left) {
                            format!("{left}{}{right}", p.convert_fragment(inner))
                        } else {
                            whole.to_owned()
                        };
                        p.state.hash_block(&block)
                    });
                    if replaced == tail {
                        break;
                    }
                    text = format!("{head}{replaced}");
                }
            }

            let text = scan::replace_ahead(&HR_RE, &text, |caps: &Captures<'_>| {
                p.state.hash_element(&caps[1])
            });
            let mut text = COMMENT.replace(&text, |whole, _, _, _| p.state.hash_block(whole));
            for re in PROCESSING_RES.iter() {
                text = scan::replace_ahead(re, &text, |caps: &Captures<'_>| {
                    p.state.hash_element(&caps[1])
                });
            }
            text
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConversionOptions, Converter};
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
    fn test_html_block_is_left_alone() {
        assert_eq!(
            render("<div>\n*raw* text\n</div>\n\nafter"),
            "<div>\n*raw* text\n</div>\n<p>after</p>"
        );
    }

    #[test]
    fn test_nested_same_tag() {
        assert_eq!(
            render("<div>\n<div>inner</div>\n_x_\n</div>"),
            "<div>\n<div>inner</div>\n_x_\n</div>"
        );
    }

    #[test]
    fn test_markdown_attribute_converts_contents() {
        assert_eq!(
            render("<section markdown=\"1\">\n*hi*\n</section>"),
            "<section markdown=\"1\"><p><em>hi</em></p></section>"
        );
    }

    #[test]
    fn test_hr_and_comment() {
        assert_eq!(render("a\n\n<hr/>\n\nb"), "<p>a</p>\n<hr/>\n<p>b</p>");
        assert_eq!(
            render("<!-- a *note* -->\n\ntext"),
            "<!-- a *note* -->\n<p>text</p>"
        );
    }

    #[test]
    fn test_backslash_escaped_tag() {
        let options = ConversionOptions {
            backslash_escapes_html_tags: true,
            ..Default::default()
        };
        assert_eq!(render_with(options, r"\<div>x\</div>"), "<p>&lt;div&gt;x&lt;/div&gt;</p>");
    }
}
