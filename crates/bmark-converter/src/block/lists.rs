//! Ordered and unordered lists, task items included.
//!
//! A list runs until a blank line followed by something that is not a list
//! marker. Its items are split on markers at the indentation of the item
//! being closed, so deeper markers stay inside the item and are parsed as a
//! sublist when the item body is parsed.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::event::Pass;
use crate::parser::Parser;
use crate::scan::{self, group};
use crate::sentinel::{END, LIST_GUARD};
use crate::text::outdent;

static LIST_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:\n\n|^\n?)(?P<marker> {0,3}(?P<bullet>[*+-]|\d+[.])[ \t]+)").unwrap()
});
static SUBLIST_START_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(?P<marker> {0,3}(?P<bullet>[*+-]|\d+[.])[ \t]+)").unwrap()
});
static ITEM_START_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(\n)?^( {0,3})(?:[*+-]|\d+[.])[ \t]+").unwrap());
static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:[*+-]|\d+[.])[ \t]+").unwrap());
static INDENTED_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ {0,3}(?:[*+-]|\d+[.])[ \t]+").unwrap());
static ORDERED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ {0,3}\d+\.[ \t]").unwrap());
static UNORDERED_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^ {0,3}[*+-][ \t]").unwrap());
static START_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ *(\d+)\.").unwrap());
static TRAILING_BLANKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}$").unwrap());
static BLANK_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static MULTI_BLANK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());
static TASK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[([xX ])]").unwrap());
static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\[[xX ]?]").unwrap());
static LEADING_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d\.)[ \t]+").unwrap());
static HEADER_THEN_TEXT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#+.+\n.+").unwrap());
static HEADER_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(#+.+)$").unwrap());

/// End of a list whose first item body starts at or after `from`.
///
/// The list ends at the end anchor, or after a run of two or more newlines
/// followed by text that does not open another item.
fn list_end(text: &str, from: usize) -> Option<usize> {
    let mut at = from;
    while at < text.len() {
        let rest = &text[at..];
        if rest.starts_with(END) {
            return Some(at + END.len());
        }
        if rest.starts_with("\n\n") {
            let run = rest.bytes().take_while(|&b| b == b'\n').count();
            let after = &rest[run..];
            if after.chars().next().is_some_and(|c| !c.is_whitespace()) && !MARKER_RE.is_match(after) {
                return Some(at + run);
            }
            at += run;
            continue;
        }
        at = scan::next_boundary(text, at);
    }
    None
}

/// End of a list item whose body starts at or after `from`.
///
/// The item takes up to two of the newlines in front of the next item or
/// the end anchor. With an `indent` the next item must sit at exactly that
/// indentation; without one, any marker indented up to three spaces counts.
fn item_end(text: &str, from: usize, indent: Option<&str>) -> Option<usize> {
    let mut at = from;
    while at < text.len() {
        if !text[at..].starts_with('\n') {
            at = scan::next_boundary(text, at);
            continue;
        }
        let run = text[at..].bytes().take_while(|&b| b == b'\n').count();
        let after = &text[at + run..];
        let next_item = after.starts_with(END)
            || match indent {
                Some(indent) => after
                    .strip_prefix(indent)
                    .is_some_and(|rest| MARKER_RE.is_match(rest)),
                None => INDENTED_MARKER_RE.is_match(after),
            };
        if next_item {
            return Some(at + run.min(2));
        }
        at += run;
    }
    None
}

impl Parser<'_> {
    /// Find lists and render them.
    ///
    /// Inside a list item any line opening with a marker starts a sublist;
    /// at the top level a list also needs the start of the text or a blank
    /// line in front of it.
    pub(crate) fn lists(&mut self, text: String) -> String {
        self.run_pass(Pass::Lists, text, |p, text| {
            let text = text + END;
            let nested = p.state.list_level > 0;
            let start_re: &Regex = if nested {
                &SUBLIST_START_RE
            } else {
                &LIST_START_RE
            };

            let mut out = String::with_capacity(text.len());
            let mut copied = 0;
            let mut at = 0;
            while at < text.len() {
                let Some(caps) = start_re.captures_at(&text, at) else {
                    break;
                };
                let (Some(whole), Some(marker), Some(bullet)) =
                    (caps.get(0), caps.name("marker"), caps.name("bullet"))
                else {
                    break;
                };
                let Some(end) = list_end(&text, scan::next_boundary(&text, marker.end())) else {
                    at = scan::next_boundary(&text, whole.start());
                    continue;
                };
                let ordered = !matches!(bullet.as_str(), "*" | "+" | "-");
                out.push_str(&text[copied..whole.start()]);
                out.push_str(&p.consecutive_lists(&text[marker.start()..end], ordered, nested));
                copied = end;
                at = end;
            }
            out.push_str(&text[copied..]);
            out.replacen(END, "", 1)
        })
    }

    /// Render a list, splitting it wherever the other marker style takes
    /// over so `-` items followed by `1.` items become two lists.
    fn consecutive_lists(&mut self, list: &str, ordered: bool, trim_trailing: bool) -> String {
        let mut out = String::new();
        let mut rest = list;
        let mut ordered = ordered;
        loop {
            let other: &Regex = if ordered {
                &UNORDERED_LINE_RE
            } else {
                &ORDERED_LINE_RE
            };
            let (chunk, next) = match other.find(rest) {
                Some(m) if m.start() > 0 => rest.split_at(m.start()),
                _ => (rest, ""),
            };
            let tag = if ordered { "ol" } else { "ul" };
            let start = START_NUMBER_RE
                .captures(chunk)
                .filter(|caps| ordered && &caps[1] != "1")
                .map(|caps| format!(" start=\"{}\"", &caps[1]))
                .unwrap_or_default();
            let items = self.list_items(chunk, trim_trailing);
            let _ = write!(out, "\n\n<{tag}{start}>\n{items}</{tag}>\n");
            if next.is_empty() {
                return out;
            }
            rest = next;
            ordered = !ordered;
        }
    }

    /// Split a list into `<li>` elements.
    fn list_items(&mut self, list: &str, trim_trailing: bool) -> String {
        self.state.list_level += 1;
        let mut list = TRAILING_BLANKS_RE.replace(list, "\n").into_owned();
        list.push_str(END);
        let paragraphed = BLANK_LINE_RE
            .find_iter(&list)
            .any(|m| !list[m.end()..].starts_with(END));
        let forced = self.options.forced_4_spaces_indented_sublists;

        let mut out = String::with_capacity(list.len());
        let mut copied = 0;
        let mut at = 0;
        while at < list.len() {
            let Some(caps) = ITEM_START_RE.captures_at(&list, at) else {
                break;
            };
            let Some(whole) = caps.get(0) else {
                break;
            };
            let indent = (!forced).then(|| group(&caps, 2));
            let Some(end) = item_end(&list, scan::next_boundary(&list, whole.end()), indent) else {
                at = scan::next_boundary(&list, whole.start());
                continue;
            };
            out.push_str(&list[copied..whole.start()]);
            let item = self.list_item(&list[whole.end()..end], caps.get(1).is_some(), paragraphed);
            out.push_str(&item);
            copied = end;
            at = end;
        }
        out.push_str(&list[copied..]);
        self.state.list_level -= 1;

        let out = out.replace(END, "");
        if trim_trailing {
            out.trim_end().to_owned()
        } else {
            out
        }
    }

    fn list_item(&mut self, raw: &str, blank_before: bool, paragraphed: bool) -> String {
        let mut item = outdent(raw);
        let mut bullet_style = String::new();
        if self.options.tasklists
            && let Some(task) = TASK_RE.captures(raw)
        {
            let done = !task[1].trim().is_empty();
            let complete = if done && self.options.more_styling {
                " task-list-item-complete"
            } else {
                ""
            };
            bullet_style = format!(
                " {}=\"task-list-item{complete}\" style=\"list-style-type: none;\"",
                self.options.class_attr()
            );
            let checked = if done { " checked" } else { "" };
            let checkbox = format!(
                "<input type=\"checkbox\" disabled style=\"margin: 0px 0.35em 0.25em -1.6em; vertical-align: middle;\"{checked}>"
            );
            item = CHECKBOX_RE.replace(&item, NoExpand(&checkbox)).into_owned();
        }
        // A marker opening the item body is text, not a sublist.
        if LEADING_MARKER_RE.is_match(&item) {
            item = format!("{LIST_GUARD}{item}");
        }
        if HEADER_THEN_TEXT_RE.is_match(&item) {
            item = HEADER_LINE_RE.replace(&item, "${1}\n").into_owned();
        }

        let loose = blank_before || item.contains("\n\n");
        let body = self
            .nested(Pass::Lists, |p| {
                if loose {
                    p.loose_item(item.clone())
                } else {
                    p.tight_item(item.clone(), paragraphed)
                }
            })
            .unwrap_or_else(|| self.span_gamut(item));
        let body = body.replacen(LIST_GUARD, "", 1);
        format!("<li{bullet_style}>{body}</li>\n")
    }

    fn loose_item(&mut self, item: String) -> String {
        let item = self.github_code_blocks(item);
        let item = self.block_quotes(item);
        let item = self.headers(item);
        let item = self.lists(item);
        let item = self.code_blocks(item);
        let item = self.tables(item);
        let item = self.hash_html_blocks(item);
        self.wrap_paragraphs(&item)
            .join("\n")
            .trim_matches('\n')
            .to_owned()
    }

    fn tight_item(&mut self, item: String, paragraphed: bool) -> String {
        let item = self.lists(item);
        let item = match item.strip_suffix('\n') {
            Some(trimmed) => trimmed.to_owned(),
            None => item,
        };
        let item = self.hash_html_blocks(item);
        let item = MULTI_BLANK_RE.replace_all(&item, "\n\n").into_owned();
        if paragraphed {
            self.paragraphs(item)
        } else {
            self.span_gamut(item)
        }
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
    fn test_list_end() {
        let text = "- a\n- b\n\npara¨0";
        assert_eq!(list_end(text, 3), Some(9));
        assert_eq!(list_end("- a\n\n- b¨0", 3), Some(11));
    }

    #[test]
    fn test_item_end_respects_indentation() {
        let text = "a\n  - b\n- c\n¨0";
        assert_eq!(item_end(text, 1, Some("")), Some(8));
        assert_eq!(item_end(text, 1, None), Some(2));
    }

    #[test]
    fn test_nested_list() {
        assert_eq!(
            render("- a\n  - b\n- c"),
            "<ul>\n<li>a<ul>\n<li>b</li></ul></li>\n<li>c</li>\n</ul>"
        );
    }

    #[test]
    fn test_ordered_start() {
        assert_eq!(
            render("3. three\n4. four"),
            "<ol start=\"3\">\n<li>three</li>\n<li>four</li>\n</ol>"
        );
        assert_eq!(render("1. one"), "<ol>\n<li>one</li>\n</ol>");
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(
            render("- a\n\n- b"),
            "<ul>\n<li><p>a</p></li>\n<li><p>b</p></li>\n</ul>"
        );
    }

    #[test]
    fn test_marker_change_starts_new_list() {
        assert_eq!(
            render("- a\n1. b"),
            "<ul>\n<li>a</li>\n</ul>\n<ol>\n<li>b</li>\n</ol>"
        );
    }

    #[test]
    fn test_forced_four_space_sublists() {
        let options = ConversionOptions {
            forced_4_spaces_indented_sublists: true,
            ..Default::default()
        };
        assert_eq!(
            render_with(options, "- a\n  - b"),
            "<ul>\n<li>a</li>\n<li>b</li>\n</ul>"
        );
    }

    #[test]
    fn test_task_list() {
        let options = ConversionOptions {
            tasklists: true,
            ..Default::default()
        };
        let html = render_with(options, "- [ ] todo\n- [x] done");
        assert!(html.contains(
            "<li class=\"task-list-item\" style=\"list-style-type: none;\"><input type=\"checkbox\" disabled style=\"margin: 0px 0.35em 0.25em -1.6em; vertical-align: middle;\"> todo</li>"
        ));
        assert!(html.contains("vertical-align: middle;\" checked> done</li>"));
    }

    #[test]
    fn test_more_styling_marks_completed_tasks() {
        let options = ConversionOptions {
            tasklists: true,
            more_styling: true,
            ..Default::default()
        };
        let html = render_with(options, "- [ ] todo\n- [x] done");
        assert_eq!(html.matches("task-list-item-complete").count(), 1);
        assert!(html.contains("<li class=\"task-list-item task-list-item-complete\" style=\"list-style-type: none;\"><input"));
        assert!(html.contains("<li class=\"task-list-item\" style=\"list-style-type: none;\"><input"));
    }

    #[test]
    fn test_task_markers_need_option() {
        assert_eq!(render("- [x] done"), "<ul>\n<li>[x] done</li>\n</ul>");
    }

    #[test]
    fn test_nesting_limit_keeps_item_text() {
        let options = ConversionOptions {
            max_nesting_depth: Some(0),
            ..Default::default()
        };
        let html = render_with(options, "- a\n  - b");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert!(html.contains("<li>a\n- b"));
    }
}
