//! Link reference definitions: `[id]: url "title"`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::parser::Parser;
use crate::scan::{self, group};
use crate::sentinel::END;
use crate::span::resolve_relative;
use crate::store::Dimensions;
use crate::text::encode_amps_and_angles;

static DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^ {0,3}\[([^\]]+)]:[ \t]*\n?[ \t]*<?([^>\s]+)>?(?: =([*\d]+[A-Za-z%]{0,4})x([*\d]+[A-Za-z%]{0,4}))?[ \t]*\n?[ \t]*(?:(\n*)["|'(](.+?)["|')][ \t]*)?(?:\n+|(?P<ahead>¨0))"#,
    )
    .unwrap()
});
static BASE64_DEFINITION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^ {0,3}\[([^\]]+)]:[ \t]*\n?[ \t]*<?(data:.+?/.+?;base64,[A-Za-z0-9+/=\n]+?)>?(?: =([*\d]+[A-Za-z%]{0,4})x([*\d]+[A-Za-z%]{0,4}))?[ \t]*\n?[ \t]*(?:(\n*)["|'(](.+?)["|')][ \t]*)?(?:\n\n|(?P<ahead>¨0|\n\[))"#,
    )
    .unwrap()
});
static DATA_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^data:.+?/.+?;base64,").unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s").unwrap());

impl Parser<'_> {
    /// Collect reference definitions into the run state and remove them.
    ///
    /// A definition whose id appears only once in the document is not
    /// referenced by anything and stays in the text.
    pub(crate) fn strip_link_definitions(&mut self, text: String) -> String {
        self.run_pass(Pass::StripLinkDefinitions, text, |p, text| {
            let text = text + END;
            let text = p.collect_definitions(&BASE64_DEFINITION_RE, &text);
            let text = p.collect_definitions(&DEFINITION_RE, &text);
            text.replacen(END, "", 1)
        })
    }

    fn collect_definitions(&mut self, re: &Regex, text: &str) -> String {
        let lowered = text.to_lowercase();
        scan::replace_ahead(re, text, |caps: &Captures<'_>| {
            let id = caps[1].to_lowercase();
            if lowered.matches(id.as_str()).count() < 2 {
                return caps[0].to_owned();
            }
            self.define(&id, caps)
        })
    }

    fn define(&mut self, id: &str, caps: &Captures<'_>) -> String {
        let url = &caps[2];
        let url = if DATA_URL_RE.is_match(url) {
            WHITESPACE_RE.replace_all(url, "").into_owned()
        } else {
            let resolved = resolve_relative(self.options.relative_path_base_url.as_deref(), url);
            encode_amps_and_angles(&resolved)
        };
        let reference = self.state.references.entry(id.to_owned()).or_default();
        reference.url = url;

        let blank_lines = group(caps, 5);
        let title = group(caps, 6);
        if !blank_lines.is_empty() {
            // A parenthetical after a blank line is text, not a title.
            return format!("{blank_lines}{title}");
        }
        if !title.is_empty() {
            reference.title = Some(title.replace(['"', '\''], "&quot;"));
        }
        if self.options.parse_img_dimensions
            && let (Some(width), Some(height)) = (caps.get(3), caps.get(4))
        {
            reference.dimensions = Some(Dimensions {
                width: width.as_str().to_owned(),
                height: height.as_str().to_owned(),
            });
        }
        String::new()
    }
}
