//! ToUnicode CMap parser.
//!
//! Reads the `beginbfchar`/`beginbfrange` sections of a `/ToUnicode` stream.
//! Destination values are UTF-16BE; ranges may map to a start value (which
//! is incremented) or to an array of explicit strings.

use std::collections::HashMap;

use crate::error::BackendError;

/// Character code → Unicode mapping from a ToUnicode stream.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    mappings: HashMap<u32, String>,
    /// Widest source code seen, in bytes; tells Identity fonts whether codes
    /// are one or two bytes.
    max_code_bytes: usize,
}

impl CMap {
    /// Parse CMap stream content.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Font`] when a hex code cannot be parsed.
    pub fn parse(data: &[u8]) -> Result<Self, BackendError> {
        let text = String::from_utf8_lossy(data);
        let mut cmap = CMap::default();

        for section in sections(&text, "beginbfchar", "endbfchar") {
            let tokens = tokens(section);
            for pair in tokens.chunks_exact(2) {
                let (Token::Hex(src), Token::Hex(dst)) = (&pair[0], &pair[1]) else {
                    continue;
                };
                let code = cmap.source_code(src)?;
                cmap.mappings.insert(code, decode_utf16be(dst)?);
            }
        }

        for section in sections(&text, "beginbfrange", "endbfrange") {
            let tokens = tokens(section);
            for triple in tokens.chunks_exact(3) {
                let (Token::Hex(lo), Token::Hex(hi)) = (&triple[0], &triple[1]) else {
                    continue;
                };
                let lo = cmap.source_code(lo)?;
                let hi = cmap.source_code(hi)?;
                if hi < lo || hi - lo > 0xFFFF {
                    continue;
                }
                match &triple[2] {
                    Token::Hex(start) => {
                        let base = decode_utf16be(start)?;
                        for offset in 0..=(hi - lo) {
                            if let Some(s) = increment_last_char(&base, offset) {
                                cmap.mappings.insert(lo + offset, s);
                            }
                        }
                    }
                    Token::Array(items) => {
                        for (offset, item) in items.iter().enumerate() {
                            let code = lo + offset as u32;
                            if code > hi {
                                break;
                            }
                            cmap.mappings.insert(code, decode_utf16be(item)?);
                        }
                    }
                }
            }
        }

        Ok(cmap)
    }

    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.mappings.get(&code).map(String::as_str)
    }

    /// Byte width of source codes (1 or 2), defaulting to 2 for empty maps.
    pub fn code_bytes(&self) -> usize {
        if self.max_code_bytes == 0 {
            2
        } else {
            self.max_code_bytes
        }
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    fn source_code(&mut self, hex: &str) -> Result<u32, BackendError> {
        self.max_code_bytes = self.max_code_bytes.max(hex.len().div_ceil(2));
        u32::from_str_radix(hex, 16)
            .map_err(|e| BackendError::Font(format!("invalid CMap code <{hex}>: {e}")))
    }
}

#[derive(Debug)]
enum Token<'a> {
    Hex(&'a str),
    Array(Vec<&'a str>),
}

fn sections<'a>(text: &'a str, begin: &str, end: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(begin) {
        let body = &rest[start + begin.len()..];
        let Some(stop) = body.find(end) else { break };
        out.push(&body[..stop]);
        rest = &body[stop + end.len()..];
    }
    out
}

/// Hex strings and `[…]` arrays of hex strings; everything else is ignored.
fn tokens(section: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut array: Option<Vec<&str>> = None;
    let mut rest = section;

    while let Some(pos) = rest.find(['<', '[', ']']) {
        match rest.as_bytes()[pos] {
            b'[' => {
                array = Some(Vec::new());
                rest = &rest[pos + 1..];
            }
            b']' => {
                if let Some(items) = array.take() {
                    out.push(Token::Array(items));
                }
                rest = &rest[pos + 1..];
            }
            _ => {
                let Some(len) = rest[pos + 1..].find('>') else { break };
                let hex = rest[pos + 1..pos + 1 + len].trim();
                match array.as_mut() {
                    Some(items) => items.push(hex),
                    None => out.push(Token::Hex(hex)),
                }
                rest = &rest[pos + 1 + len + 1..];
            }
        }
    }
    out
}

fn decode_utf16be(hex: &str) -> Result<String, BackendError> {
    let digits: String = hex.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = if digits.len() % 4 == 2 {
        format!("00{digits}")
    } else {
        digits
    };
    let units = digits
        .as_bytes()
        .chunks(4)
        .map(|chunk| {
            let s = std::str::from_utf8(chunk).unwrap_or("");
            u16::from_str_radix(s, 16)
                .map_err(|e| BackendError::Font(format!("invalid UTF-16BE <{hex}>: {e}")))
        })
        .collect::<Result<Vec<u16>, _>>()?;
    Ok(String::from_utf16_lossy(&units))
}

fn increment_last_char(base: &str, offset: u32) -> Option<String> {
    let mut chars: Vec<char> = base.chars().collect();
    let last = chars.pop()?;
    chars.push(char::from_u32(u32::from(last) + offset)?);
    Some(chars.into_iter().collect())
}
