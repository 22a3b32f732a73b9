//! Unicode normalization for reconstructed cell text.

use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

/// Normalization form applied to cell text before it is written out.
///
/// PDFs produced by Japanese office software often mix full-width and
/// half-width forms of digits and Latin letters; `Nfkc` folds them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum UnicodeNorm {
    /// Leave text as extracted.
    #[default]
    None,
    /// Canonical composition.
    Nfc,
    /// Compatibility composition.
    Nfkc,
}

impl UnicodeNorm {
    /// Apply this normalization form, borrowing when nothing changes.
    pub fn apply<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match self {
            UnicodeNorm::None => Cow::Borrowed(text),
            UnicodeNorm::Nfc => Cow::Owned(text.nfc().collect()),
            UnicodeNorm::Nfkc => Cow::Owned(text.nfkc().collect()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnicodeNorm::None => "none",
            UnicodeNorm::Nfc => "nfc",
            UnicodeNorm::Nfkc => "nfkc",
        }
    }
}
