//! Font loading and glyph decoding.
//!
//! A [`Font`] turns the bytes of a shown string into [`Glyph`]s carrying a
//! Unicode text, a code and an advance width in glyph space (1/1000 em).

use std::collections::HashMap;

use encoding_rs::Encoding;

use crate::cjk_encoding::{decode_cjk_string, encoding_for_cmap};
use crate::cmap::CMap;
use crate::lopdf_backend::{dict_get, name_of, number_of, resolve, stream_bytes};
use crate::simple_encoding::{DifferencesItem, SimpleEncoding};
use crate::standard_fonts::standard_widths;

const DEFAULT_ASCENT: f64 = 750.0;
const DEFAULT_DESCENT: f64 = -250.0;
const DEFAULT_WIDTH: f64 = 600.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// One decoded glyph of a shown string.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    pub unicode: String,
    /// Advance width in glyph space units.
    pub width: f64,
    /// Single-byte code 32, which receives word spacing.
    pub is_space: bool,
}

#[derive(Debug, Clone)]
enum FontKind {
    Simple(SimpleEncoding),
    /// Type0 with a predefined legacy CMap (`90ms-RKSJ-H` and friends).
    Legacy(&'static Encoding),
    /// Type0 with `Identity-H`/`Identity-V` (or an embedded CMap we treat as
    /// identity), code bytes per glyph.
    Identity(usize),
}

/// A font resource ready for decoding.
#[derive(Debug, Clone)]
pub struct Font {
    /// BaseFont with any `ABCDEF+` subset prefix removed.
    pub name: String,
    pub ascent: f64,
    pub descent: f64,
    kind: FontKind,
    to_unicode: Option<CMap>,
    first_char: u32,
    widths: Vec<f64>,
    cid_widths: HashMap<u32, f64>,
    default_width: f64,
}

impl Default for Font {
    /// Fallback used when `Tf` names a font missing from the resources.
    fn default() -> Self {
        Self {
            name: String::new(),
            ascent: DEFAULT_ASCENT,
            descent: DEFAULT_DESCENT,
            kind: FontKind::Simple(SimpleEncoding::default()),
            to_unicode: None,
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: DEFAULT_WIDTH,
        }
    }
}

/// Strip a six-letter subset tag such as `ABCDEF+`.
pub fn strip_subset_prefix(name: &str) -> &str {
    match name.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => {
            rest
        }
        _ => name,
    }
}

impl Font {
    /// Load a font from its dictionary.
    pub fn load(doc: &lopdf::Document, dict: &lopdf::Dictionary) -> Self {
        let name = dict_get(doc, dict, b"BaseFont")
            .and_then(name_of)
            .map(|n| strip_subset_prefix(&n).to_string())
            .unwrap_or_default();

        let to_unicode = dict_get(doc, dict, b"ToUnicode")
            .and_then(|obj| obj.as_stream().ok())
            .and_then(stream_bytes)
            .and_then(|bytes| match CMap::parse(&bytes) {
                Ok(cmap) => Some(cmap),
                Err(e) => {
                    tracing::warn!(font = %name, error = %e, "ignoring unreadable ToUnicode CMap");
                    None
                }
            });

        let is_type0 = dict_get(doc, dict, b"Subtype")
            .and_then(name_of)
            .is_some_and(|s| s == "Type0");

        if is_type0 {
            Self::load_type0(doc, dict, name, to_unicode)
        } else {
            Self::load_simple(doc, dict, name, to_unicode)
        }
    }

    fn load_simple(
        doc: &lopdf::Document,
        dict: &lopdf::Dictionary,
        name: String,
        to_unicode: Option<CMap>,
    ) -> Self {
        let explicit: Option<Vec<f64>> = dict_get(doc, dict, b"Widths")
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|o| number_of(resolve(doc, o)).unwrap_or(0.0))
                    .collect()
            });
        let (first_char, widths) = match explicit {
            Some(widths) => {
                let first_char = dict_get(doc, dict, b"FirstChar")
                    .and_then(number_of)
                    .map_or(0, |v| v as u32);
                (first_char, widths)
            }
            // Standard 14 faces may omit /Widths; their tables start at code 0.
            None => (
                0,
                standard_widths(&name)
                    .map(|table| table.iter().copied().map(f64::from).collect())
                    .unwrap_or_default(),
            ),
        };

        let descriptor = dict_get(doc, dict, b"FontDescriptor").and_then(|o| o.as_dict().ok());
        let (ascent, descent) = descriptor_metrics(doc, descriptor);
        let default_width = descriptor
            .and_then(|d| dict_get(doc, d, b"MissingWidth"))
            .and_then(number_of)
            .filter(|w| *w > 0.0)
            .unwrap_or(DEFAULT_WIDTH);

        let encoding = match dict_get(doc, dict, b"Encoding") {
            Some(lopdf::Object::Dictionary(enc)) => {
                let items: Vec<lopdf::Object> = dict_get(doc, enc, b"Differences")
                    .and_then(|o| o.as_array().ok())
                    .cloned()
                    .unwrap_or_default();
                let parsed: Vec<DifferencesItem<'_>> = items
                    .iter()
                    .filter_map(|o| match o {
                        lopdf::Object::Integer(i) => Some(DifferencesItem::Code(*i as u32)),
                        lopdf::Object::Name(n) => {
                            std::str::from_utf8(n).ok().map(DifferencesItem::Name)
                        }
                        _ => None,
                    })
                    .collect();
                SimpleEncoding::with_differences(&parsed)
            }
            _ => SimpleEncoding::default(),
        };

        Self {
            name,
            ascent,
            descent,
            kind: FontKind::Simple(encoding),
            to_unicode,
            first_char,
            widths,
            cid_widths: HashMap::new(),
            default_width,
        }
    }

    fn load_type0(
        doc: &lopdf::Document,
        dict: &lopdf::Dictionary,
        name: String,
        to_unicode: Option<CMap>,
    ) -> Self {
        let cmap_name = dict_get(doc, dict, b"Encoding").and_then(name_of);
        let kind = match cmap_name.as_deref().and_then(encoding_for_cmap) {
            Some(encoding) => FontKind::Legacy(encoding),
            None => FontKind::Identity(to_unicode.as_ref().map_or(2, CMap::code_bytes)),
        };

        let descendant = dict_get(doc, dict, b"DescendantFonts")
            .and_then(|o| o.as_array().ok())
            .and_then(|arr| arr.first())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());

        let default_width = descendant
            .and_then(|d| dict_get(doc, d, b"DW"))
            .and_then(number_of)
            .unwrap_or(DEFAULT_CID_WIDTH);
        let cid_widths = descendant
            .and_then(|d| dict_get(doc, d, b"W"))
            .and_then(|o| o.as_array().ok())
            .map(|arr| parse_w_array(doc, arr))
            .unwrap_or_default();
        let descriptor = descendant
            .and_then(|d| dict_get(doc, d, b"FontDescriptor"))
            .and_then(|o| o.as_dict().ok());
        let (ascent, descent) = descriptor_metrics(doc, descriptor);

        Self {
            name,
            ascent,
            descent,
            kind,
            to_unicode,
            first_char: 0,
            widths: Vec::new(),
            cid_widths,
            default_width,
        }
    }

    /// Decode the bytes of one shown string.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        match &self.kind {
            FontKind::Simple(encoding) => bytes
                .iter()
                .map(|&b| {
                    let code = u32::from(b);
                    let unicode = self
                        .mapped(code)
                        .or_else(|| encoding.decode(b))
                        .unwrap_or_else(|| char::from(b).to_string());
                    Glyph {
                        code,
                        unicode,
                        width: self.simple_width(code),
                        is_space: b == b' ',
                    }
                })
                .collect(),
            FontKind::Legacy(encoding) => decode_cjk_string(bytes, encoding)
                .into_iter()
                .map(|dc| Glyph {
                    code: dc.char_code,
                    unicode: self.mapped(dc.char_code).unwrap_or(dc.unicode),
                    // No CID table here: single-byte codes are half-width.
                    width: if dc.byte_len == 1 {
                        self.default_width / 2.0
                    } else {
                        self.default_width
                    },
                    is_space: dc.byte_len == 1 && dc.char_code == 32,
                })
                .collect(),
            FontKind::Identity(code_bytes) => bytes
                .chunks(*code_bytes)
                .map(|chunk| {
                    let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                    Glyph {
                        code,
                        unicode: self
                            .mapped(code)
                            .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string()),
                        width: self
                            .cid_widths
                            .get(&code)
                            .copied()
                            .unwrap_or(self.default_width),
                        is_space: *code_bytes == 1 && code == 32,
                    }
                })
                .collect(),
        }
    }

    fn mapped(&self, code: u32) -> Option<String> {
        self.to_unicode
            .as_ref()
            .and_then(|cmap| cmap.lookup(code))
            .map(str::to_string)
    }

    fn simple_width(&self, code: u32) -> f64 {
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

fn descriptor_metrics(doc: &lopdf::Document, descriptor: Option<&lopdf::Dictionary>) -> (f64, f64) {
    let Some(desc) = descriptor else {
        return (DEFAULT_ASCENT, DEFAULT_DESCENT);
    };
    let ascent = dict_get(doc, desc, b"Ascent")
        .and_then(number_of)
        .filter(|a| *a > 0.0)
        .unwrap_or(DEFAULT_ASCENT);
    let descent = dict_get(doc, desc, b"Descent")
        .and_then(number_of)
        .map(|d| if d > 0.0 { -d } else { d })
        .unwrap_or(DEFAULT_DESCENT);
    (ascent, descent)
}

/// Parse a CIDFont `/W` array: `c [w1 w2 …]` or `c_first c_last w`.
fn parse_w_array(doc: &lopdf::Document, items: &[lopdf::Object]) -> HashMap<u32, f64> {
    let mut widths = HashMap::new();
    let mut i = 0;
    while i < items.len() {
        let Some(start) = number_of(resolve(doc, &items[i])) else {
            i += 1;
            continue;
        };
        let start = start as u32;
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(lopdf::Object::Array(list)) => {
                for (offset, w) in list.iter().enumerate() {
                    if let Some(w) = number_of(resolve(doc, w)) {
                        widths.insert(start + offset as u32, w);
                    }
                }
                i += 2;
            }
            Some(end) => {
                let end = number_of(end).map_or(start, |e| e as u32);
                if let Some(w) = items.get(i + 2).and_then(|o| number_of(resolve(doc, o))) {
                    for cid in start..=end.min(start.saturating_add(0xFFFF)) {
                        widths.insert(cid, w);
                    }
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}
