//! Code spans: text between backtick runs of equal length.

use std::ops::Range;

use crate::event::Pass;
use crate::parser::Parser;
use crate::text::encode_code;

impl Parser<'_> {
    /// Replace code spans with span markers.
    pub(crate) fn code_spans(&mut self, text: String) -> String {
        self.run_pass(Pass::CodeSpans, text, |p, text| {
            let mut out = String::with_capacity(text.len());
            let mut last = 0;
            let mut at = 0;
            while let Some((span, content)) = find_code_span(&text, at, last) {
                out.push_str(&text[last..span.start]);
                let code = content.trim_matches(|c| c == ' ' || c == '\t');
                out.push_str(&p.state.hash_span(&format!("<code>{}</code>", encode_code(code))));
                last = span.end;
                at = span.end;
            }
            out.push_str(&text[last..]);
            out
        })
    }
}

/// Next code span starting at or after `from`, with its content range.
///
/// An opening run must not follow a backslash, nor directly follow the
/// previous span (`prev_end`) unless at the start of a line. The longest
/// opening that closes wins; the closing run has the same length and is not
/// part of a longer run.
fn find_code_span(text: &str, from: usize, prev_end: usize) -> Option<(Range<usize>, &str)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let blocked = i > 0
            && (bytes[i - 1] == b'\\' || (i == prev_end && prev_end > 0 && bytes[i - 1] != b'\n'));
        if !blocked {
            let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
            for len in (1..=run).rev() {
                if let Some(close) = find_closing(bytes, i + len, len) {
                    return Some((i..close + len, &text[i + len..close]));
                }
            }
        }
        i += 1;
    }
    None
}

/// Start of the first run of exactly `len` backticks after `content_start`
/// that closes a non-empty content ending in something other than a backtick.
fn find_closing(bytes: &[u8], content_start: usize, len: usize) -> Option<usize> {
    let mut p = content_start + 1;
    while p + len <= bytes.len() {
        if bytes[p] == b'`' && bytes[p - 1] != b'`' {
            let run = bytes[p..].iter().take_while(|&&b| b == b'`').count();
            if run == len {
                return Some(p);
            }
            p += run;
        } else {
            p += 1;
        }
    }
    None
}
