//! Option presets.

use std::fmt;
use std::str::FromStr;

use bmark_converter::{ConversionOptions, HeaderIdStyle};
use serde::Deserialize;

/// A named preset of conversion options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum Flavor {
    /// The default options.
    #[default]
    Vanilla,
    /// Classic Markdown: no header ids, no fenced code.
    Original,
    /// GitHub-flavored Markdown.
    Github,
    /// Ghost blogging platform.
    Ghost,
    /// Every optional feature switched on.
    AllOn,
}

/// Error for unrecognized flavor names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown flavor \"{0}\", expected one of: vanilla, original, github, ghost, allOn")]
pub struct UnknownFlavor(pub String);

impl Flavor {
    /// Every flavor.
    pub const ALL: [Flavor; 5] = [
        Flavor::Vanilla,
        Flavor::Original,
        Flavor::Github,
        Flavor::Ghost,
        Flavor::AllOn,
    ];

    /// Flavor name as written in config files.
    pub fn name(self) -> &'static str {
        match self {
            Self::Vanilla => "vanilla",
            Self::Original => "original",
            Self::Github => "github",
            Self::Ghost => "ghost",
            Self::AllOn => "allOn",
        }
    }

    /// Options of this preset.
    pub fn options(self) -> ConversionOptions {
        let defaults = ConversionOptions::default();
        match self {
            Self::Vanilla => defaults,
            Self::Original => ConversionOptions {
                no_header_id: true,
                gh_code_blocks: false,
                ..defaults
            },
            Self::Github => ConversionOptions {
                omit_extra_wl_in_code_blocks: true,
                literal_mid_word_underscores: true,
                strikethrough: true,
                tables: true,
                tables_header_id: true,
                gh_code_blocks: true,
                tasklists: true,
                forced_4_spaces_indented_sublists: false,
                simple_line_breaks: true,
                require_space_before_heading_text: true,
                header_id_style: HeaderIdStyle::GithubCompatible,
                gh_mentions: true,
                backslash_escapes_html_tags: true,
                emoji: true,
                split_adjacent_blockquotes: true,
                ..defaults
            },
            Self::Ghost => ConversionOptions {
                omit_extra_wl_in_code_blocks: true,
                parse_img_dimensions: true,
                literal_mid_word_underscores: true,
                strikethrough: true,
                tables: true,
                tables_header_id: true,
                gh_code_blocks: true,
                tasklists: true,
                smooth_live_preview: true,
                simple_line_breaks: true,
                require_space_before_heading_text: true,
                gh_mentions: false,
                encode_emails: true,
                ..defaults
            },
            Self::AllOn => ConversionOptions {
                omit_extra_wl_in_code_blocks: true,
                no_header_id: true,
                raw_prefix_header_id: true,
                header_id_style: HeaderIdStyle::GithubCompatible,
                customized_header_id: true,
                parse_img_dimensions: true,
                literal_mid_word_underscores: true,
                strikethrough: true,
                tables: true,
                tables_header_id: true,
                gh_code_blocks: true,
                tasklists: true,
                smooth_live_preview: true,
                smart_indentation_fix: true,
                forced_4_spaces_indented_sublists: true,
                simple_line_breaks: true,
                require_space_before_heading_text: true,
                gh_mentions: true,
                encode_emails: true,
                open_links_in_new_window: true,
                backslash_escapes_html_tags: true,
                emoji: true,
                underline: true,
                ellipsis: true,
                metadata: true,
                split_adjacent_blockquotes: true,
                more_styling: true,
                jsx: true,
                ..defaults
            },
        }
    }
}

impl FromStr for Flavor {
    type Err = UnknownFlavor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "vanilla" => Ok(Self::Vanilla),
            "original" => Ok(Self::Original),
            "github" => Ok(Self::Github),
            "ghost" => Ok(Self::Ghost),
            "allon" | "all-on" => Ok(Self::AllOn),
            _ => Err(UnknownFlavor(s.to_owned())),
        }
    }
}

impl TryFrom<String> for Flavor {
    type Error = UnknownFlavor;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_names() {
        assert_eq!("GitHub".parse::<Flavor>().unwrap(), Flavor::Github);
        assert_eq!("allOn".parse::<Flavor>().unwrap(), Flavor::AllOn);
        assert_eq!("all-on".parse::<Flavor>().unwrap(), Flavor::AllOn);
        let err = "markdown".parse::<Flavor>().unwrap_err();
        assert!(err.to_string().contains("\"markdown\""));
    }

    #[test]
    fn test_names_round_trip() {
        for flavor in Flavor::ALL {
            assert_eq!(flavor.name().parse::<Flavor>().unwrap(), flavor);
            assert_eq!(flavor.to_string(), flavor.name());
        }
    }

    #[test]
    fn test_vanilla_is_default() {
        assert_eq!(Flavor::Vanilla.options(), ConversionOptions::default());
    }

    #[test]
    fn test_original_disables_fences_and_ids() {
        let options = Flavor::Original.options();
        assert!(options.no_header_id);
        assert!(!options.gh_code_blocks);
        assert!(!options.tables);
    }

    #[test]
    fn test_github_preset() {
        let options = Flavor::Github.options();
        assert!(options.tables);
        assert!(options.tasklists);
        assert!(options.gh_mentions);
        assert_eq!(options.header_id_style, HeaderIdStyle::GithubCompatible);
        assert_eq!(options.container_class, ConversionOptions::default().container_class);
    }

    #[test]
    fn test_ghost_preset() {
        let options = Flavor::Ghost.options();
        assert!(options.smooth_live_preview);
        assert!(options.parse_img_dimensions);
        assert!(!options.gh_mentions);
    }
}
