//! Regex helpers for patterns the `regex` crate cannot express directly.

use regex::{Captures, Regex};

/// Name of the capture group treated as a lookahead by [`replace_ahead`].
pub(crate) const AHEAD: &str = "ahead";

/// Replace every match of `re`, treating the `ahead` group as a lookahead.
///
/// The `ahead` group has to match for the whole pattern to match, but the
/// text it covers is left in place and is scanned again by the next search.
/// Patterns without an `ahead` group behave like `replace_all`.
pub(crate) fn replace_ahead<F>(re: &Regex, text: &str, mut replacer: F) -> String
where
    F: FnMut(&Captures<'_>) -> String,
{
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut at = 0;
    while at <= text.len() {
        let Some(caps) = re.captures_at(text, at) else {
            break;
        };
        let Some(whole) = caps.get(0) else {
            break;
        };
        let end = caps.name(AHEAD).map_or(whole.end(), |m| m.start());
        out.push_str(&text[last..whole.start()]);
        out.push_str(&replacer(&caps));
        last = end;
        at = if end > whole.start() {
            end
        } else {
            next_boundary(text, end)
        };
    }
    out.push_str(&text[last..]);
    out
}

/// Byte offset of the character after `pos`, or past the end.
pub(crate) fn next_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

/// Replace `re` matches accepted by `accept`; rejected matches stay as they are.
///
/// Mirrors a replace callback that hands back the whole match when a
/// post-condition fails.
pub(crate) fn replace_if<A, F>(re: &Regex, text: &str, accept: A, mut replacer: F) -> String
where
    A: Fn(&Captures<'_>) -> bool,
    F: FnMut(&Captures<'_>) -> String,
{
    re.replace_all(text, |caps: &Captures<'_>| {
        if accept(caps) {
            replacer(caps)
        } else {
            caps[0].to_owned()
        }
    })
    .into_owned()
}

/// Text of capture group `i`, or `""` when it did not participate.
pub(crate) fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

/// Strip leading and trailing newlines.
pub(crate) fn trim_newlines(text: &str) -> &str {
    text.trim_matches('\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_ahead_leaves_lookahead_text() {
        let re = Regex::new(r"a(?P<ahead>b)").unwrap();
        assert_eq!(replace_ahead(&re, "abab", |_| "X".to_owned()), "XbXb");
    }

    #[test]
    fn test_replace_ahead_rescans_lookahead() {
        // Each `x` is followed by another `x`, the shared one is matched twice.
        let re = Regex::new(r"x(?P<ahead>x)").unwrap();
        assert_eq!(replace_ahead(&re, "xxx", |_| "y".to_owned()), "yyx");
    }

    #[test]
    fn test_replace_ahead_without_group() {
        let re = Regex::new(r"\d").unwrap();
        assert_eq!(replace_ahead(&re, "a1b2", |_| "#".to_owned()), "a#b#");
    }

    #[test]
    fn test_replace_ahead_empty_match_progresses() {
        let re = Regex::new(r"(?P<ahead>¨)").unwrap();
        assert_eq!(replace_ahead(&re, "a¨b", |_| "-".to_owned()), "a-¨b");
    }

    #[test]
    fn test_replace_if_keeps_rejected() {
        let re = Regex::new(r"\*(\S[^*]*)\*").unwrap();
        let out = replace_if(
            &re,
            "*a* *b *",
            |caps| !caps[1].ends_with(' '),
            |caps| format!("<em>{}</em>", &caps[1]),
        );
        assert_eq!(out, "<em>a</em> *b *");
    }
}
