//! Block grammar.
//!
//! [`Parser::block_gamut`] runs the block passes in a fixed order. Each
//! finished block is parked in the block store and replaced by a marker on
//! its own paragraph; [`Parser::paragraphs`] wraps what is left in `<p>` and
//! substitutes the markers back.

mod code;
mod headers;
mod html;
mod lists;
mod metadata;
mod references;
mod tables;

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::parser::Parser;
use crate::sentinel::END;

static BLANK_LINES_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static BLOCK_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"¨(?:K\d+K|G\d+G)").unwrap());
static LEADING_BLANKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[ \t]*").unwrap());
static RULE_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?m)^ {0,2}(?: ?-){3,}[ \t]*$").unwrap(),
        Regex::new(r"(?m)^ {0,2}(?: ?\*){3,}[ \t]*$").unwrap(),
        Regex::new(r"(?m)^ {0,2}(?: ?_){3,}[ \t]*$").unwrap(),
    ]
});
static QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^ {0,3}>[ \t]?.+\n(?:.+\n)*\n*)+").unwrap());
static SPLIT_QUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ {0,3}>[\s\S]*?\n\n").unwrap());
static QUOTE_MARK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*>[ \t]?").unwrap());
static WHITESPACE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]+$").unwrap());
static LINE_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^").unwrap());
static PRE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*<pre>[\s\S]+?</pre>").unwrap());
static PRE_INDENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^  ").unwrap());

impl Parser<'_> {
    /// Run every block pass over `text`.
    pub(crate) fn block_gamut(&mut self, text: String) -> String {
        self.run_pass(Pass::BlockGamut, text, |p, text| {
            let text = p.block_quotes(text);
            let text = p.headers(text);
            let text = p.horizontal_rule(text);
            let text = p.lists(text);
            let text = p.code_blocks(text);
            let text = p.tables(text);
            let text = p.hash_html_blocks(text);
            p.paragraphs(text)
        })
    }

    /// Wrap loose text in `<p>` and substitute block markers back.
    pub(crate) fn paragraphs(&mut self, text: String) -> String {
        self.run_pass(Pass::Paragraphs, text, |p, text| {
            let chunks = p.wrap_paragraphs(&text);
            let resolved: Vec<String> = chunks
                .iter()
                .map(|chunk| p.state.unhash_blocks(chunk))
                .collect();
            resolved.join("\n").trim_matches('\n').to_owned()
        })
    }

    /// Split on blank lines and wrap every chunk with content in `<p>`.
    ///
    /// Chunks holding a block marker are passed through untouched.
    pub(crate) fn wrap_paragraphs(&mut self, text: &str) -> Vec<String> {
        BLANK_LINES_RE
            .split(text.trim_matches('\n'))
            .filter_map(|chunk| {
                if BLOCK_MARKER_RE.is_match(chunk) {
                    Some(chunk.to_owned())
                } else if chunk.contains(|c: char| !c.is_whitespace()) {
                    let span = self.span_gamut(chunk.to_owned());
                    Some(format!("{}</p>", LEADING_BLANKS_RE.replace(&span, "<p>")))
                } else {
                    None
                }
            })
            .collect()
    }

    /// `---`, `***` and `___` lines, spaces allowed between the characters.
    pub(crate) fn horizontal_rule(&mut self, text: String) -> String {
        self.run_pass(Pass::HorizontalRule, text, |p, text| {
            RULE_RES.iter().fold(text, |text, re| {
                re.replace_all(&text, |_: &Captures<'_>| p.state.hash_block("<hr />"))
                    .into_owned()
            })
        })
    }

    /// Runs of `>` lines become `<blockquote>`, their contents parsed as blocks.
    pub(crate) fn block_quotes(&mut self, text: String) -> String {
        self.run_pass(Pass::BlockQuotes, text, |p, text| {
            let text = text + "\n\n";
            let re: &Regex = if p.options.split_adjacent_blockquotes {
                &SPLIT_QUOTE_RE
            } else {
                &QUOTE_RE
            };
            re.replace_all(&text, |caps: &Captures<'_>| {
                let quote = QUOTE_MARK_RE.replace_all(&caps[0], "").replace(END, "");
                let quote = WHITESPACE_LINE_RE.replace_all(&quote, "").into_owned();
                let quote = p.github_code_blocks(quote);
                let quote = p
                    .nested(Pass::BlockQuotes, |p| p.block_gamut(quote.clone()))
                    .unwrap_or_else(|| p.paragraphs(quote));
                let quote = LINE_START_RE.replace_all(&quote, "  ");
                let quote = PRE_RE.replace_all(&quote, |pre: &Captures<'_>| {
                    PRE_INDENT_RE.replace_all(&pre[0], "").into_owned()
                });
                p.state
                    .hash_block(&format!("<blockquote>\n{quote}\n</blockquote>"))
            })
            .into_owned()
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
    fn test_title_and_paragraph() {
        assert_eq!(
            render("# Title\n\nSome **bold** and _em_.\n"),
            "<h1 id=\"title\">Title</h1>\n<p>Some <strong>bold</strong> and <em>em</em>.</p>"
        );
    }

    #[test]
    fn test_horizontal_rules() {
        assert_eq!(render("a\n\n---\n\nb"), "<p>a</p>\n<hr />\n<p>b</p>");
        assert_eq!(render("* * *"), "<hr />");
        assert_eq!(render("___"), "<hr />");
    }

    #[test]
    fn test_blank_lines_split_paragraphs() {
        assert_eq!(render("one\ntwo\n\n\n\nthree"), "<p>one\ntwo</p>\n<p>three</p>");
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            render("> quoted *text*\n> more"),
            "<blockquote>\n  <p>quoted <em>text</em>\n  more</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_nested_blockquote() {
        assert_eq!(
            render("> outer\n>\n> > inner"),
            "<blockquote>\n  <p>outer</p>\n  <blockquote>\n    <p>inner</p>\n  </blockquote>\n</blockquote>"
        );
    }

    #[test]
    fn test_blockquote_keeps_code_unindented() {
        assert_eq!(
            render("> ```\n> a\n>   b\n> ```"),
            "<blockquote>\n<pre><code>a\n  b\n</code></pre>\n</blockquote>"
        );
    }

    #[test]
    fn test_split_adjacent_blockquotes() {
        let text = "> a\n\n> b";
        assert_eq!(
            render(text),
            "<blockquote>\n  <p>a</p>\n  <p>b</p>\n</blockquote>"
        );
        let options = ConversionOptions {
            split_adjacent_blockquotes: true,
            ..Default::default()
        };
        assert_eq!(
            render_with(options, text),
            "<blockquote>\n  <p>a</p>\n</blockquote>\n<blockquote>\n  <p>b</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_nesting_limit_stops_descending() {
        let options = ConversionOptions {
            max_nesting_depth: Some(0),
            ..Default::default()
        };
        assert_eq!(
            render_with(options, "> # not a header"),
            "<blockquote>\n  <p># not a header</p>\n</blockquote>"
        );
    }

    #[test]
    fn test_wrapper_div() {
        let html = Converter::default().to_html("hi");
        assert_eq!(html, "<div class=\"bmark-markdown\">\n<p>hi</p>\n</div>");
    }
}
