//! Complete HTML page around a rendered fragment.

use std::fmt::Write;

use bmark_converter::Metadata;
use serde::{Deserialize, Serialize};

/// `<meta name content>` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaTag {
    /// Meta name.
    pub name: String,
    /// Meta content.
    pub content: String,
}

/// External script tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTag {
    /// Script URL.
    pub src: String,
    /// Load as an ES module.
    #[serde(default)]
    pub module: bool,
}

/// Page-level settings for [`render_document`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentOptions {
    /// `lang` attribute of `<html>`, `en` when unset.
    pub lang: Option<String>,
    /// Page title.
    pub title: Option<String>,
    /// Document charset, `UTF-8` when unset.
    pub charset: Option<String>,
    /// Favicon URL.
    pub favicon: Option<String>,
    /// Stylesheets linked from the head.
    pub css_links: Vec<String>,
    /// Extra meta tags.
    pub meta_tags: Vec<MetaTag>,
    /// Scripts loaded in the head.
    pub head_scripts: Vec<ScriptTag>,
    /// Scripts loaded at the end of the body.
    pub body_scripts: Vec<ScriptTag>,
}

impl DocumentOptions {
    /// Fill unset fields from a parsed metadata block.
    ///
    /// `title`, `charset` and `lang`/`language` set the matching fields when
    /// they are unset; `doctype` is ignored; every other key becomes a meta
    /// tag. Values set explicitly are kept.
    pub fn merge_metadata(&mut self, metadata: &Metadata) {
        for (key, value) in &metadata.parsed {
            let value = decode_entities(value);
            match key.to_lowercase().as_str() {
                "doctype" => {}
                "title" => {
                    self.title.get_or_insert(value);
                }
                "charset" => {
                    self.charset.get_or_insert(value);
                }
                "lang" | "language" => {
                    self.lang.get_or_insert_with(|| value.clone());
                    self.push_meta(key, value);
                }
                _ => self.push_meta(key, value),
            }
        }
    }

    fn push_meta(&mut self, name: &str, content: String) {
        if self.meta_tags.iter().any(|tag| tag.name == name) {
            return;
        }
        self.meta_tags.push(MetaTag {
            name: name.to_owned(),
            content,
        });
    }
}

/// Metadata values arrive entity-encoded; attributes are escaped on output.
fn decode_entities(value: &str) -> String {
    value.replace("&quot;", "\"").replace("&amp;", "&")
}

/// Escape text for use in HTML content or a quoted attribute.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

fn write_scripts(out: &mut String, scripts: &[ScriptTag]) {
    for script in scripts {
        let kind = if script.module { " type=\"module\"" } else { "" };
        let _ = writeln!(out, "<script{kind} src=\"{}\"></script>", escape_html(&script.src));
    }
}

/// Wrap a rendered fragment in a complete HTML document.
pub fn render_document(fragment: &str, options: &DocumentOptions) -> String {
    let lang = options.lang.as_deref().unwrap_or("en");
    let charset = options.charset.as_deref().unwrap_or("UTF-8");

    let mut out = String::with_capacity(fragment.len() + 512);
    out.push_str("<!DOCTYPE html>\n");
    let _ = writeln!(out, "<html lang=\"{}\">", escape_html(lang));
    out.push_str("<head>\n");
    let _ = writeln!(out, "<meta charset=\"{}\">", escape_html(charset));
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    for tag in &options.meta_tags {
        let _ = writeln!(
            out,
            "<meta name=\"{}\" content=\"{}\">",
            escape_html(&tag.name),
            escape_html(&tag.content)
        );
    }
    for href in &options.css_links {
        let _ = writeln!(out, "<link rel=\"stylesheet\" href=\"{}\">", escape_html(href));
    }
    if let Some(favicon) = &options.favicon {
        let _ = writeln!(
            out,
            "<link rel=\"shortcut icon\" href=\"{}\" type=\"image/x-icon\">",
            escape_html(favicon)
        );
    }
    write_scripts(&mut out, &options.head_scripts);
    if let Some(title) = &options.title {
        let _ = writeln!(out, "<title>{}</title>", escape_html(title));
    }
    out.push_str("</head>\n<body>\n");
    out.push_str(fragment.trim());
    out.push('\n');
    write_scripts(&mut out, &options.body_scripts);
    out.push_str("</body>\n</html>\n");
    out
}
