//! Character type and CJK helpers.

use crate::geometry::BBox;

/// A single rendered glyph with its Unicode text and page-space bbox.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Char {
    /// Unicode text (usually one char, ligatures may carry more).
    pub text: String,
    /// Bounding box in top-left origin page coordinates.
    pub bbox: BBox,
    /// Base font name with any subset prefix stripped.
    pub fontname: String,
    /// Font size in text space units.
    pub size: f64,
    /// True when the glyph is not rotated or sheared.
    pub upright: bool,
}

/// Whether a character belongs to a CJK script (ideographs, kana, hangul,
/// CJK punctuation or full-width forms).
pub fn is_cjk(ch: char) -> bool {
    matches!(ch as u32,
        0x3000..=0x303F     // CJK symbols and punctuation
        | 0x3040..=0x309F   // Hiragana
        | 0x30A0..=0x30FF   // Katakana
        | 0x3400..=0x4DBF   // CJK extension A
        | 0x4E00..=0x9FFF   // CJK unified ideographs
        | 0xAC00..=0xD7AF   // Hangul syllables
        | 0xF900..=0xFAFF   // CJK compatibility ideographs
        | 0xFF00..=0xFFEF   // Half-width and full-width forms
        | 0x20000..=0x2FA1F // Supplementary ideographs
    )
}

/// Whether the first character of `text` is CJK.
pub fn is_cjk_text(text: &str) -> bool {
    text.chars().next().is_some_and(is_cjk)
}
