//! `:name:` emoji shortcodes.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::event::Pass;
use crate::parser::Parser;

static SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":(\S+?):").unwrap());

static EMOJI: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| GLYPHS.iter().copied().collect());

const GLYPHS: &[(&str, &str)] = &[
    ("+1", "\u{1f44d}"),
    ("-1", "\u{1f44e}"),
    ("100", "\u{1f4af}"),
    ("alarm_clock", "\u{23f0}"),
    ("angry", "\u{1f620}"),
    ("apple", "\u{1f34e}"),
    ("arrow_down", "\u{2b07}\u{fe0f}"),
    ("arrow_left", "\u{2b05}\u{fe0f}"),
    ("arrow_right", "\u{27a1}\u{fe0f}"),
    ("arrow_up", "\u{2b06}\u{fe0f}"),
    ("bangbang", "\u{203c}\u{fe0f}"),
    ("beer", "\u{1f37a}"),
    ("bell", "\u{1f514}"),
    ("blush", "\u{1f60a}"),
    ("bomb", "\u{1f4a3}"),
    ("book", "\u{1f4d6}"),
    ("boom", "\u{1f4a5}"),
    ("bug", "\u{1f41b}"),
    ("bulb", "\u{1f4a1}"),
    ("calendar", "\u{1f4c6}"),
    ("cat", "\u{1f431}"),
    ("check", "\u{2714}\u{fe0f}"),
    ("clap", "\u{1f44f}"),
    ("clipboard", "\u{1f4cb}"),
    ("cloud", "\u{2601}\u{fe0f}"),
    ("coffee", "\u{2615}"),
    ("confused", "\u{1f615}"),
    ("construction", "\u{1f6a7}"),
    ("cry", "\u{1f622}"),
    ("dog", "\u{1f436}"),
    ("eyes", "\u{1f440}"),
    ("fire", "\u{1f525}"),
    ("gem", "\u{1f48e}"),
    ("gift", "\u{1f381}"),
    ("grin", "\u{1f601}"),
    ("grinning", "\u{1f600}"),
    ("hammer", "\u{1f528}"),
    ("heart", "\u{2764}\u{fe0f}"),
    ("heavy_check_mark", "\u{2714}\u{fe0f}"),
    ("hourglass", "\u{231b}"),
    ("information_source", "\u{2139}\u{fe0f}"),
    ("joy", "\u{1f602}"),
    ("key", "\u{1f511}"),
    ("laughing", "\u{1f606}"),
    ("link", "\u{1f517}"),
    ("lock", "\u{1f512}"),
    ("mag", "\u{1f50d}"),
    ("memo", "\u{1f4dd}"),
    ("moon", "\u{1f314}"),
    ("muscle", "\u{1f4aa}"),
    ("no_entry", "\u{26d4}"),
    ("ok_hand", "\u{1f44c}"),
    ("package", "\u{1f4e6}"),
    ("pencil2", "\u{270f}\u{fe0f}"),
    ("point_right", "\u{1f449}"),
    ("pray", "\u{1f64f}"),
    ("pushpin", "\u{1f4cc}"),
    ("question", "\u{2753}"),
    ("raised_hands", "\u{1f64c}"),
    ("recycle", "\u{267b}\u{fe0f}"),
    ("rocket", "\u{1f680}"),
    ("rotating_light", "\u{1f6a8}"),
    ("scream", "\u{1f631}"),
    ("see_no_evil", "\u{1f648}"),
    ("shipit", "\u{1f43f}\u{fe0f}"),
    ("slightly_smiling_face", "\u{1f642}"),
    ("smile", "\u{1f604}"),
    ("smiley", "\u{1f603}"),
    ("smirk", "\u{1f60f}"),
    ("sob", "\u{1f62d}"),
    ("sparkles", "\u{2728}"),
    ("star", "\u{2b50}"),
    ("stop_sign", "\u{1f6d1}"),
    ("sunglasses", "\u{1f60e}"),
    ("sunny", "\u{2600}\u{fe0f}"),
    ("tada", "\u{1f389}"),
    ("thinking", "\u{1f914}"),
    ("thumbsdown", "\u{1f44e}"),
    ("thumbsup", "\u{1f44d}"),
    ("trophy", "\u{1f3c6}"),
    ("umbrella", "\u{2614}"),
    ("unlock", "\u{1f513}"),
    ("warning", "\u{26a0}\u{fe0f}"),
    ("wave", "\u{1f44b}"),
    ("white_check_mark", "\u{2705}"),
    ("wink", "\u{1f609}"),
    ("wrench", "\u{1f527}"),
    ("x", "\u{274c}"),
    ("zap", "\u{26a1}"),
    ("zzz", "\u{1f4a4}"),
];

/// Glyph for an emoji shortcode name.
pub(crate) fn emoji_glyph(name: &str) -> Option<&'static str> {
    EMOJI.get(name).copied()
}

impl Parser<'_> {
    /// Replace known `:name:` shortcodes with their glyphs.
    pub(crate) fn emoji(&mut self, text: String) -> String {
        if !self.options.emoji {
            return text;
        }
        self.run_pass(Pass::Emoji, text, |_, text| {
            SHORTCODE_RE
                .replace_all(&text, |caps: &Captures<'_>| {
                    emoji_glyph(&caps[1]).map_or_else(|| caps[0].to_owned(), str::to_owned)
                })
                .into_owned()
        })
    }
}
