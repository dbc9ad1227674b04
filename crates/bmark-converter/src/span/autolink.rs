//! Autolinks: `<url>`, `<email>`, `@mentions`, and bare URLs and emails.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::links::capture;
use crate::event::Pass;
use crate::parser::Parser;
use crate::scan::{self, group};
use crate::sentinel::escape_link_chars;

static ANGLE_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<(((?:https?|ftp)://|www\.)[^'">\s]+)>"#).unwrap());
static ANGLE_MAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:mailto:)?([-.\w]+@[-a-z0-9]+(\.[-a-z0-9]+)*\.[a-z]+)>").unwrap()
});
static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|\s)(\\)?(@([a-z\d]+(?:[a-z\d._-]+?[a-z\d]+)*))").unwrap()
});
static NAKED_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)([_*~]*?)(((?:https?|ftp)://|www\.)[^\s<>"'`´.-][^\s<>"'`´]*?\.[a-z\d.]+[^\s<>"']*)"#,
    )
    .unwrap()
});
static NAKED_MAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)(^|\s)(?:mailto:)?([A-Za-z0-9!#$%&'*+-/=?^_`{|}~.]+@[-a-z0-9]+(\.[-a-z0-9]+)*\.[a-z]+)(?P<ahead>$|\s)",
    )
    .unwrap()
});

/// Characters trimmed from the end of a bare URL.
const TRAILING_PUNCTUATION: &str = "_*~,;:.!?";

/// Obfuscate an address as a mix of decimal and hex character references.
///
/// The mix is derived from the address itself, so the same address always
/// encodes the same way. `@` is always encoded.
pub(crate) fn encode_email_address(address: &str) -> String {
    // FNV-1a seed, xorshift stream.
    let mut seed = address.bytes().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
        (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
    });
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        seed % 100
    };
    let mut out = String::with_capacity(address.len() * 6);
    for c in address.chars() {
        let roll = next();
        let code = u32::from(c);
        if c == '@' {
            if roll < 50 {
                let _ = write!(out, "&#{code};");
            } else {
                let _ = write!(out, "&#x{code:x};");
            }
        } else if roll > 90 {
            out.push(c);
        } else if roll > 45 {
            let _ = write!(out, "&#x{code:x};");
        } else {
            let _ = write!(out, "&#{code};");
        }
    }
    out
}

/// Decode the handful of entities an address can carry.
fn unescape_html_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Split trailing punctuation and unbalanced closing brackets off a URL.
fn trim_url(url: &str) -> (&str, &str) {
    let mut end = url.len();
    while let Some(c) = url[..end].chars().next_back() {
        let current = &url[..end];
        let strip = match c {
            ')' => current.matches('(').count() < current.matches(')').count(),
            ']' => current.matches('[').count() < current.matches(']').count(),
            _ => TRAILING_PUNCTUATION.contains(c),
        };
        if !strip {
            break;
        }
        end -= c.len_utf8();
    }
    (&url[..end], &url[end..])
}

impl Parser<'_> {
    pub(crate) fn angle_bracket_links(&mut self, text: String) -> String {
        self.run_pass(Pass::LinksAngleBrackets, text, |p, text| {
            let text = ANGLE_URL_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    let shown = &caps[1];
                    let url = if caps[2].eq_ignore_ascii_case("www.") {
                        format!("http://{shown}")
                    } else {
                        shown.to_owned()
                    };
                    let found = capture(&caps[0], shown, "", &url, "");
                    p.write_anchor(Pass::LinksAngleBrackets, found, false)
                })
                .into_owned();
            ANGLE_MAIL_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    let address = unescape_html_entities(&caps[1]);
                    let (shown, href) = if p.options.encode_emails {
                        (
                            encode_email_address(&address),
                            encode_email_address(&format!("mailto:{address}")),
                        )
                    } else {
                        (address.clone(), format!("mailto:{address}"))
                    };
                    let found = capture(&caps[0], &shown, "", &href, "");
                    p.write_anchor(Pass::LinksAngleBrackets, found, false)
                })
                .into_owned()
        })
    }

    pub(crate) fn mention_links(&mut self, text: String) -> String {
        if !self.options.gh_mentions {
            return text;
        }
        self.run_pass(Pass::LinksGhMentions, text, |p, text| {
            MENTION_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    let lead = &caps[1];
                    let mention = &caps[3];
                    if caps.get(2).is_some() {
                        return format!("{lead}{mention}");
                    }
                    let url = p.options.gh_mentions_link.replace("{u}", &caps[4]);
                    let found = capture(&caps[0], mention, "", &url, "");
                    format!("{lead}{}", p.write_anchor(Pass::LinksGhMentions, found, false))
                })
                .into_owned()
        })
    }

    /// Link bare URLs and email addresses.
    ///
    /// Emphasis characters wrapped around a URL stay outside the anchor, and
    /// trailing punctuation is moved after it.
    pub(crate) fn naked_links(&mut self, text: String) -> String {
        self.run_pass(Pass::LinksNaked, text, |p, text| {
            let text = NAKED_URL_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    let lead = &caps[1];
                    let matched = &caps[2];
                    let (lead, closing, matched) = match matched.strip_suffix(lead) {
                        Some(inner) if !lead.is_empty() => (lead, lead, inner),
                        _ => (lead, "", matched),
                    };
                    let (url, suffix) = trim_url(matched);
                    let href = if group(caps, 3).eq_ignore_ascii_case("www.") {
                        format!("http://{url}")
                    } else {
                        url.to_owned()
                    };
                    let shown = escape_link_chars(url);
                    let found = capture(&caps[0], &shown, "", &href, "");
                    let anchor = p.write_anchor(Pass::LinksNaked, found, false);
                    format!("{lead}{anchor}{suffix}{closing}")
                })
                .into_owned();
            scan::replace_ahead(&NAKED_MAIL_RE, &text, |caps| {
                let lead = group(caps, 1);
                let address = unescape_html_entities(group(caps, 2));
                let href = if p.options.encode_emails {
                    encode_email_address(&format!("mailto:{address}"))
                } else {
                    format!("mailto:{address}")
                };
                let found = capture(group(caps, 0), &address, "", &href, "");
                format!("{lead}{}", p.write_anchor(Pass::LinksNaked, found, false))
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

    fn plain() -> ConversionOptions {
        ConversionOptions {
            encode_emails: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_angle_bracket_url() {
        assert_eq!(
            render_with(plain(), "<http://example.com/a_b>"),
            r#"<p><a href="http://example.com/a_b">http://example.com/a_b</a></p>"#
        );
        assert_eq!(
            render_with(plain(), "<www.example.com>"),
            r#"<p><a href="http://www.example.com">www.example.com</a></p>"#
        );
    }

    #[test]
    fn test_angle_bracket_mail() {
        assert_eq!(
            render_with(plain(), "<mailto:me@example.com>"),
            r#"<p><a href="mailto:me@example.com">me@example.com</a></p>"#
        );
    }

    #[test]
    fn test_encoded_mail_is_deterministic() {
        let first = encode_email_address("mailto:me@example.com");
        assert_eq!(first, encode_email_address("mailto:me@example.com"));
        assert!(!first.contains('@'));
        let html = render_with(ConversionOptions::default(), "<me@example.com>");
        assert!(html.contains("&#"));
        assert!(!html.contains("me@example.com"));
    }

    #[test]
    fn test_mentions() {
        let options = ConversionOptions {
            gh_mentions: true,
            ..Default::default()
        };
        assert_eq!(
            render_with(options.clone(), "hi @octo"),
            r#"<p>hi <a href="https://github.com/octo">@octo</a></p>"#
        );
        assert_eq!(render_with(options, r"hi \@octo"), "<p>hi @octo</p>");
    }

    #[test]
    fn test_naked_url_trims_punctuation() {
        assert_eq!(
            render_with(plain(), "see http://example.com/x."),
            r#"<p>see <a href="http://example.com/x">http://example.com/x</a>.</p>"#
        );
        assert_eq!(
            render_with(plain(), "(www.example.com)"),
            r#"<p>(<a href="http://www.example.com">www.example.com</a>)</p>"#
        );
    }

    #[test]
    fn test_naked_url_inside_emphasis() {
        assert_eq!(
            render_with(plain(), "**http://example.com**"),
            r#"<p><strong><a href="http://example.com">http://example.com</a></strong></p>"#
        );
    }

    #[test]
    fn test_naked_email() {
        assert_eq!(
            render_with(plain(), "write to me@example.com today"),
            r#"<p>write to <a href="mailto:me@example.com">me@example.com</a> today</p>"#
        );
    }

    #[test]
    fn test_trim_url() {
        assert_eq!(trim_url("http://a.b/c)."), ("http://a.b/c", ")."));
        assert_eq!(trim_url("http://a.b/(c)"), ("http://a.b/(c)", ""));
    }
}
