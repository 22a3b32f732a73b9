//! Single-byte encodings for simple (Type1/TrueType/Type3) fonts.

use std::collections::HashMap;

/// Byte → Unicode decoding for a simple font.
///
/// The base encoding is WinAnsi, which is Windows code page 1252 as far as
/// text extraction is concerned; `/Differences` entries override it per code.
#[derive(Debug, Clone, Default)]
pub struct SimpleEncoding {
    differences: HashMap<u8, char>,
}

impl SimpleEncoding {
    /// Build from a parsed `/Differences` array: a code followed by the glyph
    /// names assigned to it and the codes after it.
    pub fn with_differences(differences: &[DifferencesItem<'_>]) -> Self {
        let mut map = HashMap::new();
        let mut code: u32 = 0;
        for item in differences {
            match item {
                DifferencesItem::Code(c) => code = *c,
                DifferencesItem::Name(name) => {
                    if let (Ok(byte), Some(ch)) = (u8::try_from(code), glyph_name_to_char(name)) {
                        map.insert(byte, ch);
                    }
                    code += 1;
                }
            }
        }
        Self { differences: map }
    }

    pub fn decode(&self, code: u8) -> Option<String> {
        if let Some(ch) = self.differences.get(&code) {
            return Some(ch.to_string());
        }
        if code < 0x20 {
            return None;
        }
        let bytes = [code];
        let (text, had_errors) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(&bytes);
        (!had_errors).then(|| text.into_owned())
    }
}

/// One entry of a `/Differences` array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DifferencesItem<'a> {
    Code(u32),
    Name(&'a str),
}

/// Resolve an Adobe glyph name.
///
/// Covers `uniXXXX`/`uXXXX[XX]` forms, single-character names and the
/// punctuation names Latin fonts commonly remap.
pub fn glyph_name_to_char(name: &str) -> Option<char> {
    let hex = name
        .strip_prefix("uni")
        .filter(|h| h.len() == 4)
        .or_else(|| name.strip_prefix('u').filter(|h| (4..=6).contains(&h.len())));
    if let Some(code) = hex.and_then(|h| u32::from_str_radix(h, 16).ok()) {
        return char::from_u32(code);
    }

    let mut chars = name.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        return Some(ch);
    }

    let ch = match name {
        "space" | "nbspace" => ' ',
        "exclam" => '!',
        "quotedbl" => '"',
        "numbersign" => '#',
        "dollar" => '$',
        "percent" => '%',
        "ampersand" => '&',
        "quotesingle" => '\'',
        "parenleft" => '(',
        "parenright" => ')',
        "asterisk" => '*',
        "plus" => '+',
        "comma" => ',',
        "hyphen" | "minus" => '-',
        "period" => '.',
        "slash" => '/',
        "zero" => '0',
        "one" => '1',
        "two" => '2',
        "three" => '3',
        "four" => '4',
        "five" => '5',
        "six" => '6',
        "seven" => '7',
        "eight" => '8',
        "nine" => '9',
        "colon" => ':',
        "semicolon" => ';',
        "less" => '<',
        "equal" => '=',
        "greater" => '>',
        "question" => '?',
        "at" => '@',
        "bracketleft" => '[',
        "backslash" => '\\',
        "bracketright" => ']',
        "underscore" => '_',
        "braceleft" => '{',
        "bar" => '|',
        "braceright" => '}',
        "quoteleft" => '\u{2018}',
        "quoteright" => '\u{2019}',
        "quotedblleft" => '\u{201C}',
        "quotedblright" => '\u{201D}',
        "bullet" => '\u{2022}',
        "endash" => '\u{2013}',
        "emdash" => '\u{2014}',
        "ellipsis" => '\u{2026}',
        "Euro" => '\u{20AC}',
        "yen" => '\u{00A5}',
        "degree" => '\u{00B0}',
        "fi" => '\u{FB01}',
        "fl" => '\u{FB02}',
        _ => return None,
    };
    Some(ch)
}
