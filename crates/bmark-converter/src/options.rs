//! Conversion options.
//!
//! [`ConversionOptions`] is a flat record of switches read by the grammar
//! passes. It is fixed for the lifetime of a [`Converter`](crate::Converter);
//! flavor presets and config files build one before construction.

/// How header ids are derived from header text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderIdStyle {
    /// Drop every non-word character and lowercase.
    #[default]
    Classic,
    /// GitHub-style: spaces become dashes, punctuation is dropped.
    GithubCompatible,
    /// Spaces and quotes become dashes, everything else is kept.
    Raw,
}

/// Options controlling the optional parts of the grammar.
///
/// # Example
///
/// ```
/// use bmark_converter::ConversionOptions;
///
/// let options = ConversionOptions {
///     tables: true,
///     strikethrough: true,
///     ..Default::default()
/// };
/// assert!(options.gh_code_blocks);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
#[allow(clippy::struct_excessive_bools)]
pub struct ConversionOptions {
    /// Omit the trailing newline inside rendered code blocks.
    pub omit_extra_wl_in_code_blocks: bool,
    /// Render headers without an `id` attribute.
    pub no_header_id: bool,
    /// Prefix added to every generated header id.
    pub prefix_header_id: Option<String>,
    /// Add the prefix after sanitizing instead of before.
    pub raw_prefix_header_id: bool,
    /// Header id strictness.
    pub header_id_style: HeaderIdStyle,
    /// Allow `# Title {custom-id}` to set the id.
    pub customized_header_id: bool,
    /// Level used for `#` headers (clamped to 1..=6).
    pub header_level_start: u8,
    /// Accept `=WxH` in reference definitions.
    pub parse_img_dimensions: bool,
    /// Underscore emphasis must sit on word boundaries.
    pub literal_mid_word_underscores: bool,
    /// `~~text~~` renders as `<del>`.
    pub strikethrough: bool,
    /// GFM pipe tables.
    pub tables: bool,
    /// Table headers get an `id` derived from their text.
    pub tables_header_id: bool,
    /// Fenced code blocks.
    pub gh_code_blocks: bool,
    /// `[ ]`/`[x]` task list items.
    pub tasklists: bool,
    /// Setext underlines need at least two characters.
    pub smooth_live_preview: bool,
    /// Remove the indentation shared by the whole input.
    pub smart_indentation_fix: bool,
    /// Sublists must be indented by four spaces instead of splitting on the
    /// parent item's indentation.
    pub forced_4_spaces_indented_sublists: bool,
    /// Every newline inside a paragraph becomes `<br />`.
    pub simple_line_breaks: bool,
    /// `#Title` is not a header.
    pub require_space_before_heading_text: bool,
    /// Link `@user` mentions.
    pub gh_mentions: bool,
    /// Mention link template, `{u}` is the user name.
    pub gh_mentions_link: String,
    /// Obfuscate email autolinks as character references.
    pub encode_emails: bool,
    /// Add `target="_blank"` to non-anchor links.
    pub open_links_in_new_window: bool,
    /// `\<div>` renders as literal text.
    pub backslash_escapes_html_tags: bool,
    /// `:name:` emoji glyphs.
    pub emoji: bool,
    /// `__text__` renders as `<u>`.
    pub underline: bool,
    /// `...` renders as an ellipsis glyph.
    pub ellipsis: bool,
    /// Parse a leading metadata block.
    pub metadata: bool,
    /// Blank-line separated quotes stay separate blockquotes.
    pub split_adjacent_blockquotes: bool,
    /// Extra classes on generated markup, such as `task-list-item-complete`.
    pub more_styling: bool,
    /// Base URL joined onto relative link and image targets.
    pub relative_path_base_url: Option<String>,
    /// Class of the wrapping `<div>`; `None` disables the wrapper.
    pub container_class: Option<String>,
    /// Emit `className` instead of `class` on generated markup.
    pub jsx: bool,
    /// Maximum nesting of block constructs before parsing stops descending.
    pub max_nesting_depth: Option<usize>,
    /// Input size accepted by [`Converter::try_to_html`](crate::Converter::try_to_html).
    pub max_input_bytes: Option<usize>,
    /// Registered extensions to load by name.
    pub extensions: Vec<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            omit_extra_wl_in_code_blocks: false,
            no_header_id: false,
            prefix_header_id: None,
            raw_prefix_header_id: false,
            header_id_style: HeaderIdStyle::Classic,
            customized_header_id: false,
            header_level_start: 1,
            parse_img_dimensions: false,
            literal_mid_word_underscores: false,
            strikethrough: false,
            tables: false,
            tables_header_id: false,
            gh_code_blocks: true,
            tasklists: false,
            smooth_live_preview: false,
            smart_indentation_fix: false,
            forced_4_spaces_indented_sublists: false,
            simple_line_breaks: false,
            require_space_before_heading_text: false,
            gh_mentions: false,
            gh_mentions_link: "https://github.com/{u}".to_owned(),
            encode_emails: true,
            open_links_in_new_window: false,
            backslash_escapes_html_tags: false,
            emoji: false,
            underline: false,
            ellipsis: true,
            metadata: false,
            split_adjacent_blockquotes: false,
            more_styling: false,
            relative_path_base_url: None,
            container_class: Some("bmark-markdown".to_owned()),
            jsx: false,
            max_nesting_depth: None,
            max_input_bytes: None,
            extensions: Vec::new(),
        }
    }
}

impl ConversionOptions {
    /// Attribute name used for CSS classes in generated markup.
    pub(crate) fn class_attr(&self) -> &'static str {
        if self.jsx { "className" } else { "class" }
    }

    /// Header level for `level` hashes, shifted by `header_level_start`.
    pub(crate) fn header_level(&self, level: usize) -> usize {
        let start = usize::from(self.header_level_start.max(1));
        (start + level - 1).min(6)
    }
}
