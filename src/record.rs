//! Line codec for ledger records.
//!
//! A record is one line of the form `OPCODE:KEY:VALUE`. Keys and values are opaque strings, so
//! the field delimiter and line terminators inside them are escaped with a backslash:
//!
//! | raw  | encoded |
//! |------|---------|
//! | `\`  | `\\`    |
//! | `:`  | `\:`    |
//! | LF   | `\n`    |
//! | CR   | `\r`    |
//!
//! Anything without those characters encodes to the plain `PUT:key:value` form.

use std::fmt;

pub const DELIMITER: char = ':';
const ESCAPE: char = '\\';
const FIELD_COUNT: usize = 3;

/// A single logged operation.
///
/// Only `Put` exists today. The enum is non-exhaustive so new opcodes (a delete marker, say) can
/// be added without breaking the line format; older readers skip them as foreign lines.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Record {
    Put { key: String, value: String },
}

impl Record {
    pub fn put(key: impl Into<String>, value: impl Into<String>) -> Self {
        Record::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn opcode(&self) -> &'static str {
        match self {
            Record::Put { .. } => "PUT",
        }
    }

    /// Serialize to a single line, without the trailing newline.
    pub fn encode(&self) -> String {
        match self {
            Record::Put { key, value } => {
                let mut line = String::with_capacity(key.len() + value.len() + 5);
                line.push_str(self.opcode());
                line.push(DELIMITER);
                escape_into(key, &mut line);
                line.push(DELIMITER);
                escape_into(value, &mut line);
                line
            }
        }
    }

    /// Parse one ledger line.
    pub fn parse(line: &str) -> Result<Record, ParseError> {
        let [opcode, key, value] = <[String; FIELD_COUNT]>::try_from(split_fields(line)?)
            .map_err(|fields| ParseError::FieldCount(fields.len()))?;

        match opcode.as_str() {
            "PUT" => Ok(Record::Put { key, value }),
            _ => Err(ParseError::UnknownOpcode(opcode)),
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Why a line is not a valid record. Replay treats every variant as a skippable corrupt entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    FieldCount(usize),
    UnknownOpcode(String),
    BadEscape(usize),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::FieldCount(n) => {
                write!(f, "expected {} fields, found {}", FIELD_COUNT, n)
            }
            ParseError::UnknownOpcode(op) => write!(f, "unknown opcode {:?}", op),
            ParseError::BadEscape(at) => write!(f, "invalid escape at byte {}", at),
        }
    }
}

impl std::error::Error for ParseError {}

/// Bytes that seal an unterminated fragment so the resulting line never parses.
///
/// The suffix always completes the invalid escape `\?`, whether or not the fragment was cut
/// right after an escape character.
pub fn torn_suffix(fragment: &[u8]) -> &'static [u8] {
    let dangling = fragment.iter().rev().take_while(|&&b| b == b'\\').count();
    if dangling % 2 == 1 {
        b"?\n"
    } else {
        b"\\?\n"
    }
}

fn escape_into(raw: &str, out: &mut String) {
    for c in raw.chars() {
        match c {
            ESCAPE => out.push_str("\\\\"),
            DELIMITER => out.push_str("\\:"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
}

/// Split on unescaped delimiters, unescaping each field.
fn split_fields(line: &str) -> Result<Vec<String>, ParseError> {
    let mut fields = Vec::with_capacity(FIELD_COUNT);
    let mut current = String::new();
    let mut chars = line.char_indices();

    while let Some((at, c)) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some((_, ESCAPE)) => current.push(ESCAPE),
                Some((_, DELIMITER)) => current.push(DELIMITER),
                Some((_, 'n')) => current.push('\n'),
                Some((_, 'r')) => current.push('\r'),
                _ => return Err(ParseError::BadEscape(at)),
            },
            DELIMITER => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);

    Ok(fields)
}
