//! Balanced delimiter matching.
//!
//! Finds text enclosed by a `left`/`right` pattern pair where the pair may
//! nest, such as `<div>` inside `<div>`. A single combined pattern is scanned
//! left to right while a depth counter tracks open delimiters.

use std::ops::Range;

use regex::Regex;

use crate::scan;

/// One balanced match, as byte ranges into the searched text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalancedMatch {
    /// The outermost left delimiter.
    pub left: Range<usize>,
    /// Everything between the delimiters.
    pub inner: Range<usize>,
    /// The closing right delimiter.
    pub right: Range<usize>,
    /// Left delimiter through right delimiter.
    pub whole: Range<usize>,
}

/// A compiled left/right delimiter pair.
///
/// `flags` uses the familiar letters: `g` reports every match instead of
/// only the first, `i` ignores case, `m` makes `^`/`$` match at lines.
///
/// # Example
///
/// ```
/// use bmark_converter::Delimiters;
///
/// let divs = Delimiters::new("<div>", "</div>", "g").unwrap();
/// let out = divs.replace("<div><div>a</div></div>!", |_, inner, _, _| inner.to_owned());
/// assert_eq!(out, "<div>a</div>!");
/// ```
#[derive(Debug, Clone)]
pub struct Delimiters {
    combined: Regex,
    global: bool,
}

impl Delimiters {
    /// Compile a delimiter pair.
    ///
    /// # Errors
    ///
    /// Returns an error if either pattern is not a valid regex.
    pub fn new(left: &str, right: &str, flags: &str) -> Result<Self, regex::Error> {
        let inline: String = flags.chars().filter(|c| matches!(c, 'i' | 'm')).collect();
        let prefix = if inline.is_empty() {
            String::new()
        } else {
            format!("(?{inline})")
        };
        let combined = Regex::new(&format!("{prefix}({left})|(?:{right})"))?;
        Ok(Self {
            combined,
            global: flags.contains('g'),
        })
    }

    /// Every balanced match, left to right.
    ///
    /// Left delimiters that never close are skipped: scanning restarts just
    /// after the first unclosed one.
    pub fn matches(&self, text: &str) -> Vec<BalancedMatch> {
        let mut found = Vec::new();
        let mut restart = 0;
        loop {
            let mut depth = 0usize;
            let mut open = 0..0;
            let mut pos = restart;
            while pos <= text.len() {
                let Some(caps) = self.combined.captures_at(text, pos) else {
                    break;
                };
                let Some(m) = caps.get(0) else {
                    break;
                };
                pos = if m.end() > m.start() {
                    m.end()
                } else {
                    scan::next_boundary(text, m.end())
                };
                if caps.get(1).is_some() {
                    if depth == 0 {
                        open = m.range();
                    }
                    depth += 1;
                } else if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        found.push(BalancedMatch {
                            left: open.clone(),
                            inner: open.end..m.start(),
                            right: m.range(),
                            whole: open.start..m.end(),
                        });
                        if !self.global {
                            return found;
                        }
                    }
                }
            }
            if depth == 0 {
                return found;
            }
            restart = if open.end > restart {
                open.end
            } else {
                scan::next_boundary(text, restart)
            };
            if restart > text.len() {
                return found;
            }
        }
    }

    /// Rebuild `text` with each balanced match replaced.
    ///
    /// The replacer receives `(whole, inner, left, right)`. Text between
    /// matches is copied through unchanged.
    pub fn replace<F>(&self, text: &str, mut replacer: F) -> String
    where
        F: FnMut(&str, &str, &str, &str) -> String,
    {
        let found = self.matches(text);
        if found.is_empty() {
            return text.to_owned();
        }
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for m in found {
            out.push_str(&text[last..m.whole.start]);
            out.push_str(&replacer(
                &text[m.whole.clone()],
                &text[m.inner],
                &text[m.left],
                &text[m.right],
            ));
            last = m.whole.end;
        }
        out.push_str(&text[last..]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parens(flags: &str) -> Delimiters {
        Delimiters::new(r"\(", r"\)", flags).unwrap()
    }

    #[test]
    fn test_global_returns_every_top_level_pair() {
        let found = parens("g").matches("(a(b)) x (c) (d(e(f)))");
        let wholes: Vec<_> = found.iter().map(|m| m.whole.clone()).collect();
        assert_eq!(wholes, vec![0..6, 9..12, 13..22]);
    }

    #[test]
    fn test_non_global_returns_first() {
        let found = parens("").matches("(a) (b)");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].inner, 1..2);
    }

    #[test]
    fn test_unbalanced_produces_nothing() {
        assert!(parens("g").matches("((a").is_empty());
        assert!(parens("g").matches("a)").is_empty());
    }

    #[test]
    fn test_unclosed_outer_restarts_inside() {
        let divs = Delimiters::new("<div>", "</div>", "g").unwrap();
        let text = "<div><div>a</div>";
        let found = divs.matches(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].whole.clone()], "<div>a</div>");
    }

    #[test]
    fn test_case_insensitive_flag() {
        let code = Delimiters::new(r"<code\b[^>]*>", "</code>", "gi").unwrap();
        let out = code.replace("<CODE>x</Code>", |_, inner, left, right| {
            format!("{left}[{inner}]{right}")
        });
        assert_eq!(out, "<CODE>[x]</Code>");
    }

    #[test]
    fn test_replace_passes_parts() {
        let out = parens("g").replace("f(x) + g(y)", |whole, inner, left, right| {
            assert_eq!(whole, format!("{left}{inner}{right}"));
            inner.to_uppercase()
        });
        assert_eq!(out, "fX + gY");
    }

    #[test]
    fn test_multiline_anchor() {
        let pre = Delimiters::new(r"^ {0,3}<pre\b[^>]*>", r"^ {0,3}</pre>", "gm").unwrap();
        let text = "text <pre>\n<pre>\nx\n</pre>\n";
        let found = pre.matches(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].inner.clone()], "\nx\n");
    }
}
