//! Multi-pass Markdown to HTML converter.
//!
//! The converter rewrites one working string through a fixed sequence of
//! regex-driven passes. Finished HTML is swapped out for placeholders so
//! that later passes never reinterpret it, and the placeholders are
//! substituted back at the end.
//!
//! # Architecture
//!
//! - [`Converter`]: options, extensions and listeners; the entry point
//! - block passes: quotes, headers, rules, lists, code, tables, paragraphs
//! - span passes: code spans, links, images, emphasis, entities
//! - [`ExtensionRegistry`]: named extensions resolved when a converter is built
//! - [`Event`]: what listeners see before and after each pass
//!
//! # Example
//!
//! ```
//! use bmark_converter::{ConversionOptions, Converter};
//!
//! let converter = Converter::new(ConversionOptions {
//!     tables: true,
//!     ..Default::default()
//! })
//! .unwrap();
//! let html = converter.to_html("| a | b |\n|---|---|\n| 1 | 2 |\n");
//! assert!(html.contains("<td>1</td>"));
//! ```

mod balanced;
mod block;
mod converter;
mod error;
mod event;
mod extension;
mod options;
mod parser;
mod scan;
mod sentinel;
mod span;
mod store;
mod text;

pub use balanced::{BalancedMatch, Delimiters};
pub use converter::{Conversion, Converter};
pub use error::{ConfigurationError, ConvertError, InvalidReason, ValidationError};
pub use event::{CaptureMatch, Event, ListenerFn, Pass, Phase, Stage};
pub use extension::{
    Extension, ExtensionKind, ExtensionRegistry, ExtensionSource, ExtensionSpec, FactoryFn,
    FilterFn, LegacyExtension, std_ext_name, validate,
};
pub use options::{ConversionOptions, HeaderIdStyle};
pub use sentinel::MARKER;
pub use store::{CodeBlockEntry, Dimensions, LinkReference, Metadata, RunState};
