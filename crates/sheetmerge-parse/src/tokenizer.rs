//! Content stream tokenizer.
//!
//! Turns raw content stream bytes into [`Operator`]s, each carrying the
//! operands that preceded it. Inline images (`BI … ID … EI`) are skipped
//! wholesale since their payload is binary and never contains text.

use crate::error::BackendError;

/// A content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Integer(i64),
    Real(f64),
    /// Name without the leading `/`.
    Name(String),
    /// Literal `(…)` or hex `<…>` string, as raw bytes.
    String(Vec<u8>),
    Array(Vec<Operand>),
    Boolean(bool),
    Null,
    Dictionary(Vec<(String, Operand)>),
}

impl Operand {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Operand::Integer(i) => Some(*i as f64),
            Operand::Real(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Operand::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Operand::String(b) => Some(b),
            _ => None,
        }
    }
}

/// An operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Operator {
    pub name: String,
    pub operands: Vec<Operand>,
}

/// Tokenize a content stream.
///
/// # Errors
///
/// Returns [`BackendError::Interpreter`] for unterminated strings, arrays or
/// dictionaries.
pub fn tokenize(input: &[u8]) -> Result<Vec<Operator>, BackendError> {
    Lexer { input, pos: 0 }.run()
}

struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n' | 0x0C | 0x00)
}

fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn unexpected(what: &str) -> BackendError {
    BackendError::Interpreter(what.to_string())
}

impl Lexer<'_> {
    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn run(mut self) -> Result<Vec<Operator>, BackendError> {
        let mut ops = Vec::new();
        let mut stack: Vec<Operand> = Vec::new();

        loop {
            self.skip_whitespace();
            let Some(b) = self.peek() else { break };

            if b.is_ascii_alphabetic() || matches!(b, b'*' | b'\'' | b'"') {
                let keyword = self.keyword();
                match keyword.as_str() {
                    "true" => stack.push(Operand::Boolean(true)),
                    "false" => stack.push(Operand::Boolean(false)),
                    "null" => stack.push(Operand::Null),
                    "BI" => {
                        self.skip_inline_image()?;
                        stack.clear();
                    }
                    _ => ops.push(Operator {
                        name: keyword,
                        operands: std::mem::take(&mut stack),
                    }),
                }
            } else if b == b']' || b == b')' || b == b'>' || b == b'{' || b == b'}' {
                // Stray closing delimiters; skip like other junk bytes.
                self.pos += 1;
            } else if let Some(operand) = self.operand()? {
                stack.push(operand);
            } else {
                self.pos += 1;
            }
        }

        Ok(ops)
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek() {
            if is_whitespace(b) {
                self.pos += 1;
            } else if b == b'%' {
                while self.peek().is_some_and(|c| c != b'\n' && c != b'\r') {
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Parse one operand at the cursor, or `None` if the byte does not start one.
    fn operand(&mut self) -> Result<Option<Operand>, BackendError> {
        let Some(b) = self.peek() else {
            return Ok(None);
        };
        let operand = match b {
            b'(' => Operand::String(self.literal_string()?),
            b'<' if self.peek_at(1) == Some(b'<') => Operand::Dictionary(self.dictionary()?),
            b'<' => Operand::String(self.hex_string()),
            b'[' => {
                self.pos += 1;
                Operand::Array(self.array()?)
            }
            b'/' => Operand::Name(self.name()),
            b'0'..=b'9' | b'+' | b'-' | b'.' => self.number(),
            _ => return Ok(None),
        };
        Ok(Some(operand))
    }

    fn literal_string(&mut self) -> Result<Vec<u8>, BackendError> {
        self.pos += 1;
        let mut out = Vec::new();
        let mut depth = 1u32;

        while let Some(b) = self.peek() {
            self.pos += 1;
            match b {
                b'(' => {
                    depth += 1;
                    out.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(out);
                    }
                    out.push(b);
                }
                b'\\' => {
                    let Some(esc) = self.peek() else { break };
                    self.pos += 1;
                    match esc {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0C),
                        b'\r' => {
                            if self.peek() == Some(b'\n') {
                                self.pos += 1;
                            }
                        }
                        b'\n' => {}
                        b'0'..=b'7' => {
                            let mut value = u32::from(esc - b'0');
                            for _ in 0..2 {
                                match self.peek() {
                                    Some(d @ b'0'..=b'7') => {
                                        value = value * 8 + u32::from(d - b'0');
                                        self.pos += 1;
                                    }
                                    _ => break,
                                }
                            }
                            out.push((value & 0xFF) as u8);
                        }
                        other => out.push(other),
                    }
                }
                other => out.push(other),
            }
        }

        Err(unexpected("unterminated literal string"))
    }

    fn hex_string(&mut self) -> Vec<u8> {
        self.pos += 1;
        let mut nibbles = Vec::new();
        while let Some(b) = self.peek() {
            self.pos += 1;
            if b == b'>' {
                break;
            }
            if let Some(v) = hex_value(b) {
                nibbles.push(v);
            }
        }
        if nibbles.len() % 2 == 1 {
            nibbles.push(0);
        }
        nibbles.chunks(2).map(|p| (p[0] << 4) | p[1]).collect()
    }

    fn array(&mut self) -> Result<Vec<Operand>, BackendError> {
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(unexpected("unterminated array")),
                Some(b']') => {
                    self.pos += 1;
                    return Ok(items);
                }
                Some(b) if b.is_ascii_alphabetic() => {
                    let keyword = self.keyword();
                    items.push(match keyword.as_str() {
                        "true" => Operand::Boolean(true),
                        "false" => Operand::Boolean(false),
                        "null" => Operand::Null,
                        _ => Operand::Name(keyword),
                    });
                }
                Some(_) => match self.operand()? {
                    Some(operand) => items.push(operand),
                    None => self.pos += 1,
                },
            }
        }
    }

    fn dictionary(&mut self) -> Result<Vec<(String, Operand)>, BackendError> {
        self.pos += 2;
        let mut entries = Vec::new();
        loop {
            self.skip_whitespace();
            match (self.peek(), self.peek_at(1)) {
                (None, _) => return Err(unexpected("unterminated dictionary")),
                (Some(b'>'), Some(b'>')) => {
                    self.pos += 2;
                    return Ok(entries);
                }
                (Some(b'/'), _) => {
                    let key = self.name();
                    self.skip_whitespace();
                    let value = match self.peek() {
                        Some(b) if b.is_ascii_alphabetic() => {
                            let keyword = self.keyword();
                            match keyword.as_str() {
                                "true" => Operand::Boolean(true),
                                "false" => Operand::Boolean(false),
                                "null" => Operand::Null,
                                _ => Operand::Name(keyword),
                            }
                        }
                        _ => self
                            .operand()?
                            .ok_or_else(|| unexpected("invalid dictionary value"))?,
                    };
                    entries.push((key, value));
                }
                (Some(_), _) => return Err(unexpected("expected name key in dictionary")),
            }
        }
    }

    fn name(&mut self) -> String {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(is_regular) {
            self.pos += 1;
        }
        let raw = &self.input[start..self.pos];

        let mut decoded = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'#' && i + 2 < raw.len() {
                if let (Some(hi), Some(lo)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                    decoded.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            decoded.push(raw[i]);
            i += 1;
        }
        String::from_utf8_lossy(&decoded).into_owned()
    }

    fn number(&mut self) -> Operand {
        let start = self.pos;
        if matches!(self.peek(), Some(b'+' | b'-')) {
            self.pos += 1;
        }
        let mut seen_dot = false;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() {
                self.pos += 1;
            } else if b == b'.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let token = String::from_utf8_lossy(&self.input[start..self.pos]);
        if seen_dot {
            Operand::Real(token.parse().unwrap_or(0.0))
        } else {
            // Out-of-range integers still carry a usable magnitude as reals.
            token
                .parse::<i64>()
                .map(Operand::Integer)
                .unwrap_or_else(|_| Operand::Real(token.parse().unwrap_or(0.0)))
        }
    }

    fn keyword(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || matches!(b, b'*' | b'\'' | b'"'))
        {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    /// Skip from just after `BI` to just after the matching `EI`.
    fn skip_inline_image(&mut self) -> Result<(), BackendError> {
        // Dictionary part up to the `ID` keyword.
        loop {
            self.skip_whitespace();
            match (self.peek(), self.peek_at(1)) {
                (None, _) => return Err(unexpected("inline image without ID")),
                (Some(b'I'), Some(b'D')) if self.peek_at(2).is_none_or(is_whitespace) => {
                    self.pos += 3;
                    break;
                }
                (Some(b), _) if b.is_ascii_alphabetic() => {
                    self.keyword();
                }
                _ => {
                    if self.operand()?.is_none() {
                        self.pos += 1;
                    }
                }
            }
        }

        // Binary payload: `EI` preceded by whitespace and followed by
        // whitespace, a delimiter or the end of input.
        while self.pos + 1 < self.input.len() {
            let at_ei = self.input[self.pos] == b'E'
                && self.input[self.pos + 1] == b'I'
                && self.pos > 0
                && is_whitespace(self.input[self.pos - 1])
                && self.peek_at(2).is_none_or(|b| !is_regular(b));
            if at_ei {
                self.pos += 2;
                return Ok(());
            }
            self.pos += 1;
        }
        Err(unexpected("inline image without EI"))
    }
}
