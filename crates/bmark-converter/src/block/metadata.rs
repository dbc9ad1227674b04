//! Leading metadata block, `«««`/`»»»` or `---` fenced.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::parser::Parser;
use crate::scan::group;
use crate::sentinel::restore;

static GUILLEMET_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*«««+[ \t]*(\S*?)\n([\s\S]+?)\n»»»+\s*\n").unwrap());
static DASHED_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*---+[ \t]*(\S*?)\n([\s\S]+?)\n---+\s*\n").unwrap());
static CONTINUATION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n {4}").unwrap());
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([\S ]+): +([\s\S]+?)$").unwrap());

impl Parser<'_> {
    /// Remove a leading metadata block, recording it in the run state.
    pub(crate) fn metadata(&mut self, text: String) -> String {
        if !self.options.metadata {
            return text;
        }
        self.run_pass(Pass::Metadata, text, |p, text| {
            for re in [&GUILLEMET_BLOCK_RE, &DASHED_BLOCK_RE] {
                if let Some(caps) = re.captures(&text) {
                    p.parse_metadata(&caps);
                    let end = caps.get(0).map_or(0, |m| m.end());
                    return text[end..].to_owned();
                }
            }
            text
        })
    }

    fn parse_metadata(&mut self, caps: &Captures<'_>) {
        let metadata = &mut self.state.metadata;
        let format = group(caps, 1);
        if !format.is_empty() {
            metadata.format = Some(format.to_owned());
        }
        let content = &caps[2];
        metadata.raw = restore(content);

        let escaped = restore(&content.replace('&', "&amp;").replace('"', "&quot;"));
        let folded = CONTINUATION_RE.replace_all(&escaped, " ");
        for entry in ENTRY_RE.captures_iter(&folded) {
            metadata.insert(entry[1].to_owned(), entry[2].to_owned());
        }
    }
}
