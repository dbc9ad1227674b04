//! Code blocks: indented, fenced, and `<pre><code>`/`<code>` already in the
//! source.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::balanced::Delimiters;
use crate::event::Pass;
use crate::parser::Parser;
use crate::scan::{self, group};
use crate::sentinel::END;
use crate::text::{detab, encode_code, outdent};

static INDENTED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\n\n|^)((?:(?:[ ]{4}|\t).*\n+)+)(?:(\n*[ ]{0,3}[^ \t\n])|(?P<ahead>¨0))").unwrap()
});
static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\n) {0,3}(```+|~~~+) *([^\n\t`~]*)\n").unwrap());
static PRE_CODE: LazyLock<Delimiters> = LazyLock::new(|| {
    Delimiters::new(
        r"^ {0,3}<pre\b[^>]*>\s*<code\b[^>]*>",
        r"^ {0,3}</code>\s*</pre>",
        "gim",
    )
    .unwrap()
});
static CODE_TAG: LazyLock<Delimiters> =
    LazyLock::new(|| Delimiters::new(r"<code\b[^>]*>", "</code>", "gim").unwrap());

/// A fenced block located in the text.
struct Fence<'t> {
    whole: std::ops::Range<usize>,
    info: &'t str,
    body: &'t str,
}

/// First fenced block at or after `from`.
///
/// The closing fence repeats the opening delimiter on its own line, after up
/// to three spaces. An opening without a closing fence is skipped.
fn find_fence(text: &str, from: usize) -> Option<Fence<'_>> {
    let mut at = from;
    while at <= text.len() {
        let caps = FENCE_OPEN_RE.captures_at(text, at)?;
        let open = caps.get(0)?;
        let delim = group(&caps, 1);
        let body_start = open.end();
        let close = text[body_start..].match_indices('\n').find_map(|(i, _)| {
            let line = body_start + i + 1;
            let spaces = text[line..].bytes().take_while(|&b| b == b' ').count();
            (spaces <= 3 && text[line + spaces..].starts_with(delim))
                .then_some((body_start + i, line + spaces + delim.len()))
        });
        if let Some((body_end, end)) = close {
            return Some(Fence {
                whole: open.start()..end,
                info: caps.get(2).map_or("", |m| m.as_str()),
                body: &text[body_start..body_end],
            });
        }
        at = scan::next_boundary(text, open.start());
    }
    None
}

impl Parser<'_> {
    fn code_end(&self) -> &'static str {
        if self.options.omit_extra_wl_in_code_blocks {
            ""
        } else {
            "\n"
        }
    }

    /// Blocks indented by four spaces or a tab.
    pub(crate) fn code_blocks(&mut self, text: String) -> String {
        self.run_pass(Pass::CodeBlocks, text, |p, text| {
            let text = text + END;
            let end = p.code_end();
            let text = scan::replace_ahead(&INDENTED_RE, &text, |caps: &Captures<'_>| {
                let code = detab(&encode_code(&outdent(group(caps, 1))));
                let code = scan::trim_newlines(&code);
                let block = p.state.hash_block(&format!("<pre><code>{code}{end}</code></pre>"));
                format!("{block}{}", group(caps, 2))
            });
            text.replacen(END, "", 1)
        })
    }

    /// Blocks fenced with three or more backticks or tildes.
    pub(crate) fn github_code_blocks(&mut self, text: String) -> String {
        if !self.options.gh_code_blocks {
            return text;
        }
        self.run_pass(Pass::GithubCodeBlocks, text, |p, text| {
            let text = text + END;
            let end = p.code_end();
            let mut out = String::with_capacity(text.len());
            let mut last = 0;
            while let Some(fence) = find_fence(&text, last) {
                out.push_str(&text[last..fence.whole.start]);
                let language = fence.info.split_whitespace().next().unwrap_or("");
                let class = if language.is_empty() {
                    String::new()
                } else {
                    format!(
                        " {}=\"{language} language-{language}\"",
                        p.options.class_attr()
                    )
                };
                let code = detab(&encode_code(fence.body));
                let code = scan::trim_newlines(&code);
                let rendered = format!("<pre><code{class}>{code}{end}</code></pre>");
                out.push_str(&p.state.hash_code_block(&text[fence.whole.clone()], rendered));
                last = fence.whole.end;
            }
            out.push_str(&text[last..]);
            out.replacen(END, "", 1)
        })
    }

    /// Park `<pre><code>` blocks written as HTML, encoding their contents.
    pub(crate) fn hash_pre_code_tags(&mut self, text: String) -> String {
        self.run_pass(Pass::HashPreCodeTags, text, |p, text| {
            PRE_CODE.replace(&text, |whole, inner, left, right| {
                let rendered = format!("{left}{}{right}", encode_code(inner));
                p.state.hash_code_block(whole, rendered)
            })
        })
    }

    /// Park inline `<code>` elements written as HTML, encoding their contents.
    pub(crate) fn hash_code_tags(&mut self, text: String) -> String {
        self.run_pass(Pass::HashCodeTags, text, |p, text| {
            CODE_TAG.replace(&text, |_, inner, left, right| {
                p.state
                    .hash_span(&format!("{left}{}{right}", encode_code(inner)))
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_find_fence_needs_matching_delimiter() {
        let text = "\n```js\nlet a;\n~~~\n```\n";
        let fence = find_fence(text, 0).unwrap();
        assert_eq!(fence.info, "js");
        assert_eq!(fence.body, "let a;\n~~~");
        assert!(find_fence("\n```\nnever closed\n", 0).is_none());
    }

    #[test]
    fn test_indented_code_block() {
        assert_eq!(
            render("para\n\n    let x = 1 < 2;\n    *y*\n\nafter"),
            "<p>para</p>\n<pre><code>let x = 1 &lt; 2;\n*y*\n</code></pre>\n<p>after</p>"
        );
    }

    #[test]
    fn test_fenced_code_block_with_language() {
        assert_eq!(
            render("```rust\nfn main() {}\n```"),
            r#"<pre><code class="rust language-rust">fn main() {}
</code></pre>"#
        );
    }

    #[test]
    fn test_tilde_fence_without_language() {
        assert_eq!(render("~~~\n<b>_x_</b>\n~~~"), "<pre><code>&lt;b&gt;_x_&lt;/b&gt;\n</code></pre>");
    }

    #[test]
    fn test_fenced_code_blocks_disabled() {
        let options = ConversionOptions {
            gh_code_blocks: false,
            ..Default::default()
        };
        assert!(!render_with(options, "```\nx\n```").contains("<pre>"));
    }

    #[test]
    fn test_omit_extra_newline() {
        let options = ConversionOptions {
            omit_extra_wl_in_code_blocks: true,
            ..Default::default()
        };
        assert_eq!(
            render_with(options, "```\nx\n```"),
            "<pre><code>x</code></pre>"
        );
    }

    #[test]
    fn test_jsx_class_name() {
        let options = ConversionOptions {
            jsx: true,
            ..Default::default()
        };
        assert_eq!(
            render_with(options, "```sh\nls\n```"),
            r#"<pre><code className="sh language-sh">ls
</code></pre>"#
        );
    }

    #[test]
    fn test_existing_pre_code_is_encoded() {
        assert_eq!(
            render("<pre><code>a < b && *c*\n</code></pre>"),
            "<pre><code>a &lt; b &amp;&amp; *c*\n</code></pre>"
        );
    }

    #[test]
    fn test_inline_code_tag_is_encoded() {
        assert_eq!(
            render("use <code>a<b</code> *here*"),
            "<p>use <code>a&lt;b</code> <em>here</em></p>"
        );
    }
}
