//! Pipe tables.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::parser::Parser;
use crate::sentinel::{END, escape_char};

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^ {0,3}\|?.+\|.+\n {0,3}\|?[ \t]*:?[ \t]*[-=]{2,}[ \t]*:?[ \t]*\|[ \t]*:?[ \t]*[-=]{2,}[\s\S]+?(?:\n\n|¨0)",
    )
    .unwrap()
});
static SINGLE_COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?m)^ {0,3}\|.+\|[ \t]*\n {0,3}\|[ \t]*:?[ \t]*[-=]{2,}[ \t]*:?[ \t]*\|[ \t]*\n(?: {0,3}\|.+\|[ \t]*\n)*(?:\n|¨0)",
    )
    .unwrap()
});
static ESCAPED_PIPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\\\|").unwrap());
static LEADING_PIPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^ {0,3}\|").unwrap());
static TRAILING_PIPE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\|[ \t]*$").unwrap());
static ALIGN_LEFT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:[ \t]*--*$").unwrap());
static ALIGN_RIGHT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--*[ \t]*:[ \t]*$").unwrap());
static ALIGN_CENTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:[ \t]*--*[ \t]*:$").unwrap());

fn alignment(cell: &str) -> &'static str {
    if ALIGN_LEFT_RE.is_match(cell) {
        " style=\"text-align:left;\""
    } else if ALIGN_RIGHT_RE.is_match(cell) {
        " style=\"text-align:right;\""
    } else if ALIGN_CENTER_RE.is_match(cell) {
        " style=\"text-align:center;\""
    } else {
        ""
    }
}

fn split_row(line: &str) -> Vec<String> {
    line.split('|').map(|cell| cell.trim().to_owned()).collect()
}

impl Parser<'_> {
    /// Multi-column and single-column pipe tables.
    pub(crate) fn tables(&mut self, text: String) -> String {
        if !self.options.tables {
            return text;
        }
        self.run_pass(Pass::Tables, text, |p, text| {
            let text = ESCAPED_PIPE_RE.replace_all(&text, escape_char('|').as_str());
            let text = format!("{text}{END}");
            let text = TABLE_RE
                .replace_all(&text, |caps: &Captures<'_>| p.parse_table(&caps[0]))
                .into_owned();
            let text = SINGLE_COLUMN_RE
                .replace_all(&text, |caps: &Captures<'_>| p.parse_table(&caps[0]))
                .into_owned();
            text.replacen(END, "", 1)
        })
    }

    /// Render one table, or hand back `raw` when it has fewer header cells
    /// than alignment cells.
    fn parse_table(&mut self, raw: &str) -> String {
        let lines: Vec<String> = raw
            .replace(END, "")
            .split('\n')
            .map(|line| {
                let line = LEADING_PIPE_RE.replace(line, "");
                let line = TRAILING_PIPE_RE.replace(&line, "").into_owned();
                self.code_spans(line)
            })
            .collect();
        let [head, align, body @ ..] = lines.as_slice() else {
            return raw.to_owned();
        };

        let raw_headers = split_row(head);
        let styles: Vec<&str> = split_row(align).iter().map(|cell| alignment(cell)).collect();
        if raw_headers.len() < styles.len() {
            return raw.to_owned();
        }
        let style = |i: usize| styles.get(i).copied().unwrap_or("");

        let mut table = String::from("<table>\n<thead>\n<tr>\n");
        for (i, header) in raw_headers.iter().enumerate() {
            let id = if self.options.tables_header_id {
                format!(" id=\"{}\"", header.replace(' ', "_").to_lowercase())
            } else {
                String::new()
            };
            let span = self.span_gamut(header.clone());
            let _ = writeln!(table, "<th{id}{}>{span}</th>", style(i));
        }
        table.push_str("</tr>\n</thead>\n<tbody>\n");

        for row in body.iter().filter(|line| !line.trim().is_empty()) {
            let cells = split_row(row);
            table.push_str("<tr>\n");
            for i in 0..raw_headers.len() {
                let cell = cells.get(i).cloned().unwrap_or_default();
                let span = self.span_gamut(cell);
                let _ = writeln!(table, "<td{}>{span}</td>", style(i));
            }
            table.push_str("</tr>\n");
        }
        table.push_str("</tbody>\n</table>\n");
        self.state.hash_block(&table)
    }
}
