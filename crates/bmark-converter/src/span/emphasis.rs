//! Emphasis, underline, strikethrough and ellipsis.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::parser::Parser;
use crate::scan;
use crate::sentinel::escape_chars;

struct Rule {
    re: Regex,
    open: &'static str,
    close: &'static str,
}

fn rule(pattern: &str, open: &'static str, close: &'static str) -> Rule {
    Rule {
        re: Regex::new(pattern).unwrap(),
        open,
        close,
    }
}

static UNDERSCORE_WORD_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"\b___(\S[\s\S]*?)___\b", "<strong><em>", "</em></strong>"),
        rule(r"\b__(\S[\s\S]*?)__\b", "<strong>", "</strong>"),
        rule(r"\b_(\S[\s\S]*?)_\b", "<em>", "</em>"),
    ]
});

static UNDERSCORE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"___(\S[\s\S]*?)___", "<strong><em>", "</em></strong>"),
        rule(r"__(\S[\s\S]*?)__", "<strong>", "</strong>"),
        rule(r"_([^\s_][\s\S]*?)_", "<em>", "</em>"),
    ]
});

static ASTERISK_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"\*\*\*(\S[\s\S]*?)\*\*\*", "<strong><em>", "</em></strong>"),
        rule(r"\*\*(\S[\s\S]*?)\*\*", "<strong>", "</strong>"),
        rule(r"\*([^\s*][\s\S]*?)\*", "<em>", "</em>"),
    ]
});

static UNDERLINE_WORD_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"\b___(\S[\s\S]*?)___\b", "<u>", "</u>"),
        rule(r"\b__(\S[\s\S]*?)__\b", "<u>", "</u>"),
    ]
});

static UNDERLINE_RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    vec![
        rule(r"___(\S[\s\S]*?)___", "<u>", "</u>"),
        rule(r"__(\S[\s\S]*?)__", "<u>", "</u>"),
    ]
});

static STRIKETHROUGH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"~~([\s\S]+?)~~").unwrap());

/// Apply each rule in turn.
///
/// With `trailing_check`, a match whose content ends in whitespace is left
/// alone so `* not emphasis *` stays literal.
fn apply_rules(text: String, rules: &[Rule], trailing_check: bool) -> String {
    rules.iter().fold(text, |text, rule| {
        scan::replace_if(
            &rule.re,
            &text,
            |caps| !trailing_check || !caps[1].ends_with(char::is_whitespace),
            |caps: &Captures<'_>| format!("{}{}{}", rule.open, &caps[1], rule.close),
        )
    })
}

impl Parser<'_> {
    /// `***`, `**`, `*` and their underscore twins.
    pub(crate) fn italics_and_bold(&mut self, text: String) -> String {
        self.run_pass(Pass::ItalicsAndBold, text, |p, text| {
            let text = if p.options.literal_mid_word_underscores {
                apply_rules(text, &UNDERSCORE_WORD_RULES, false)
            } else {
                apply_rules(text, &UNDERSCORE_RULES, true)
            };
            apply_rules(text, &ASTERISK_RULES, true)
        })
    }

    /// `__text__` as `<u>`; remaining underscores are escaped so they no
    /// longer start emphasis.
    pub(crate) fn underline(&mut self, text: String) -> String {
        if !self.options.underline {
            return text;
        }
        self.run_pass(Pass::Underline, text, |p, text| {
            let text = if p.options.literal_mid_word_underscores {
                apply_rules(text, &UNDERLINE_WORD_RULES, false)
            } else {
                apply_rules(text, &UNDERLINE_RULES, true)
            };
            escape_chars(&text, "_")
        })
    }

    /// `~~text~~` as `<del>`.
    pub(crate) fn strikethrough(&mut self, text: String) -> String {
        if !self.options.strikethrough {
            return text;
        }
        self.run_pass(Pass::Strikethrough, text, |_, text| {
            STRIKETHROUGH_RE
                .replace_all(&text, "<del>$1</del>")
                .into_owned()
        })
    }

    /// `...` as a single ellipsis glyph.
    pub(crate) fn ellipsis(&mut self, text: String) -> String {
        if !self.options.ellipsis {
            return text;
        }
        self.run_pass(Pass::Ellipsis, text, |_, text| text.replace("...", "\u{2026}"))
    }
}

#[cfg(test)]
mod tests {
    use crate::{ConversionOptions, Converter};
    use pretty_assertions::assert_eq;

    fn render(options: ConversionOptions, text: &str) -> String {
        let options = ConversionOptions {
            container_class: None,
            ..options
        };
        Converter::new(options).unwrap().to_html(text)
    }

    #[test]
    fn test_bold_and_italic() {
        assert_eq!(
            render(ConversionOptions::default(), "***a*** **b** *c* __d__ _e_"),
            "<p><strong><em>a</em></strong> <strong>b</strong> <em>c</em> <strong>d</strong> <em>e</em></p>"
        );
    }

    #[test]
    fn test_spaced_asterisks_stay_literal() {
        assert_eq!(
            render(ConversionOptions::default(), "a * b * c"),
            "<p>a * b * c</p>"
        );
    }

    #[test]
    fn test_mid_word_underscores() {
        let options = ConversionOptions {
            literal_mid_word_underscores: true,
            ..Default::default()
        };
        assert_eq!(render(options, "snake_case_name"), "<p>snake_case_name</p>");
        assert_eq!(
            render(ConversionOptions::default(), "snake_case_name"),
            "<p>snake<em>case</em>name</p>"
        );
    }

    #[test]
    fn test_underline() {
        let options = ConversionOptions {
            underline: true,
            ..Default::default()
        };
        assert_eq!(render(options, "__under__ _x_"), "<p><u>under</u> _x_</p>");
    }

    #[test]
    fn test_strikethrough() {
        let options = ConversionOptions {
            strikethrough: true,
            ..Default::default()
        };
        assert_eq!(render(options, "~~gone~~"), "<p><del>gone</del></p>");
        assert_eq!(
            render(ConversionOptions::default(), "~~kept~~"),
            "<p>~~kept~~</p>"
        );
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(
            render(ConversionOptions::default(), "wait..."),
            "<p>wait\u{2026}</p>"
        );
        let options = ConversionOptions {
            ellipsis: false,
            ..Default::default()
        };
        assert_eq!(render(options, "wait..."), "<p>wait...</p>");
    }
}
