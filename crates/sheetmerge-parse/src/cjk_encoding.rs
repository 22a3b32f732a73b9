//! Predefined CJK CMap encodings.
//!
//! Type0 fonts whose `/Encoding` names a predefined CMap such as
//! `90ms-RKSJ-H` carry legacy multi-byte strings. Those are decoded with
//! `encoding_rs` rather than a CID table.

use encoding_rs::Encoding;

/// One character decoded from a legacy multi-byte string.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChar {
    /// Raw code (1 or 2 bytes combined big-endian).
    pub char_code: u32,
    pub unicode: String,
    pub byte_len: usize,
}

/// Map a predefined CMap name to its legacy encoding.
///
/// Returns `None` for `Identity-H`/`Identity-V` and for unknown names.
pub fn encoding_for_cmap(cmap_name: &str) -> Option<&'static Encoding> {
    let base = cmap_name
        .strip_suffix("-H")
        .or_else(|| cmap_name.strip_suffix("-V"))
        .unwrap_or(cmap_name);

    match base {
        "90ms-RKSJ" | "90msp-RKSJ" | "90pv-RKSJ" | "83pv-RKSJ" | "78-RKSJ" | "Add-RKSJ"
        | "Ext-RKSJ" => Some(encoding_rs::SHIFT_JIS),
        "EUC" | "78-EUC" | "Hankaku" => Some(encoding_rs::EUC_JP),
        "GBK-EUC" | "GB-EUC" | "GBpc-EUC" | "GBK2K" => Some(encoding_rs::GBK),
        "B5pc" | "ETen-B5" | "HKscs-B5" | "ETenms-B5" => Some(encoding_rs::BIG5),
        "KSC-EUC" | "KSCms-UHC" | "KSCpc-EUC" => Some(encoding_rs::EUC_KR),
        _ => None,
    }
}

/// Split `bytes` into characters and decode each one.
pub fn decode_cjk_string(bytes: &[u8], encoding: &'static Encoding) -> Vec<DecodedChar> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let byte_len = if is_lead_byte(bytes[i], encoding) && i + 1 < bytes.len() {
            2
        } else {
            1
        };
        let raw = &bytes[i..i + byte_len];
        let char_code = raw.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
        let (unicode, _, _) = encoding.decode(raw);
        out.push(DecodedChar {
            char_code,
            unicode: unicode.into_owned(),
            byte_len,
        });
        i += byte_len;
    }
    out
}

fn is_lead_byte(byte: u8, encoding: &'static Encoding) -> bool {
    if encoding == encoding_rs::SHIFT_JIS {
        (0x81..=0x9F).contains(&byte) || (0xE0..=0xFC).contains(&byte)
    } else if encoding == encoding_rs::EUC_JP {
        (0xA1..=0xFE).contains(&byte) || byte == 0x8E
    } else {
        (0x81..=0xFE).contains(&byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn japanese_cmap_names() {
        assert_eq!(encoding_for_cmap("90ms-RKSJ-H"), Some(encoding_rs::SHIFT_JIS));
        assert_eq!(encoding_for_cmap("90ms-RKSJ-V"), Some(encoding_rs::SHIFT_JIS));
        assert_eq!(encoding_for_cmap("EUC-H"), Some(encoding_rs::EUC_JP));
        assert_eq!(encoding_for_cmap("Identity-H"), None);
    }

    #[test]
    fn shift_jis_mixed_width() {
        // "A山" in Shift_JIS: 0x41, 0x8E 0x52
        let chars = decode_cjk_string(&[0x41, 0x8E, 0x52], encoding_rs::SHIFT_JIS);
        assert_eq!(chars.len(), 2);
        assert_eq!(chars[0].unicode, "A");
        assert_eq!(chars[1].unicode, "山");
        assert_eq!(chars[1].char_code, 0x8E52);
        assert_eq!(chars[1].byte_len, 2);
    }

    #[test]
    fn shift_jis_half_width_katakana_is_single_byte() {
        let chars = decode_cjk_string(&[0xB1], encoding_rs::SHIFT_JIS);
        assert_eq!(chars[0].unicode, "ｱ");
        assert_eq!(chars[0].byte_len, 1);
    }

    #[test]
    fn truncated_lead_byte() {
        let chars = decode_cjk_string(&[0x8E], encoding_rs::SHIFT_JIS);
        assert_eq!(chars.len(), 1);
        assert_eq!(chars[0].byte_len, 1);
    }
}
