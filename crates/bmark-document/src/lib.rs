//! Document-level helpers around the bmark converter.
//!
//! The converter renders Markdown fragments. This crate handles what sits
//! around a fragment:
//!
//! - [`FrontMatter`]: splits a leading YAML block off the source
//! - [`render_document`]: wraps a rendered fragment in a complete HTML page
//!
//! # Example
//!
//! ```
//! use bmark_converter::Converter;
//! use bmark_document::{DocumentOptions, FrontMatter, render_document};
//!
//! let parsed = FrontMatter::extract("---\ntitle: Notes\n---\n# Hello\n").unwrap();
//! let fragment = Converter::default().to_html(&parsed.content);
//! let options = DocumentOptions {
//!     title: parsed.data["title"].as_str().map(str::to_owned),
//!     ..Default::default()
//! };
//! let page = render_document(&fragment, &options);
//! assert!(page.contains("<title>Notes</title>"));
//! ```

mod document;
mod front_matter;

pub use document::{DocumentOptions, MetaTag, ScriptTag, render_document};
pub use front_matter::{FrontMatter, Parsed};

/// Document processing error.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Front matter is not valid YAML.
    #[error("Invalid front matter: {0}")]
    FrontMatter(#[from] serde_yaml::Error),
    /// Opening `---` without a closing fence.
    #[error("Front matter is not terminated by a closing ---")]
    UnterminatedFrontMatter,
    /// Front matter cannot be represented as JSON.
    #[error("Front matter cannot be converted to JSON: {0}")]
    Json(#[from] serde_json::Error),
}
