use serde::{Deserialize, Serialize};

use super::{Field, Message, Segment};
use crate::error::DecodeError;

/// Delimiters declared in the MSH header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Separators {
    pub field: char,
    pub component: char,
    pub repetition: char,
    pub escape: Option<char>,
    pub subcomponent: char,
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            field: '|',
            component: '^',
            repetition: '~',
            escape: Some('\\'),
            subcomponent: '&',
        }
    }
}

impl Separators {
    fn from_header(field: char, encoding: &str) -> Self {
        let defaults = Self::default();
        let mut chars = encoding.chars();
        Self {
            field,
            component: chars.next().unwrap_or(defaults.component),
            repetition: chars.next().unwrap_or(defaults.repetition),
            escape: chars.next(),
            subcomponent: chars.next().unwrap_or(defaults.subcomponent),
        }
    }

    /// Replaces delimiter escape sequences (`\F\`, `\S\`, `\T\`, `\R\`, `\E\`).
    ///
    /// Other sequences (formatting, hex) are left untouched.
    pub fn unescape(&self, value: &str) -> String {
        let Some(esc) = self.escape else {
            return value.to_string();
        };
        if !value.contains(esc) {
            return value.to_string();
        }

        let mut out = String::with_capacity(value.len());
        let mut rest = value;
        while let Some(start) = rest.find(esc) {
            out.push_str(&rest[..start]);
            let after = &rest[start + esc.len_utf8()..];
            let replacement = after.find(esc).and_then(|end| {
                let seq = &after[..end];
                let ch = match seq {
                    "F" => self.field,
                    "S" => self.component,
                    "T" => self.subcomponent,
                    "R" => self.repetition,
                    "E" => esc,
                    _ => return None,
                };
                Some((ch, end))
            });

            match replacement {
                Some((ch, end)) => {
                    out.push(ch);
                    rest = &after[end + esc.len_utf8()..];
                }
                None => {
                    out.push(esc);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

impl Message {
    /// Decodes pipe-delimited message text.
    ///
    /// Segments may be terminated by `\r`, `\n` or `\r\n`. The first segment must be
    /// MSH; its header declares the separators used for the rest of the message.
    pub fn parse(raw: &str) -> std::result::Result<Self, DecodeError> {
        let mut lines = raw
            .split(['\r', '\n'])
            .map(|l| l.trim_end_matches(['\u{0b}', '\u{1c}']))
            .map(|l| l.trim_start_matches('\u{0b}'))
            .filter(|l| !l.trim().is_empty());

        let header = lines.next().ok_or(DecodeError::Empty)?;
        if !header.starts_with("MSH") {
            return Err(DecodeError::MissingHeader {
                found: header.chars().take(3).collect(),
            });
        }

        let field_sep = header[3..].chars().next().ok_or(DecodeError::TruncatedHeader)?;
        let after_sep = &header[3 + field_sep.len_utf8()..];
        let encoding = after_sep.split(field_sep).next().unwrap_or_default();
        if encoding.is_empty() {
            return Err(DecodeError::TruncatedHeader);
        }
        let separators = Separators::from_header(field_sep, encoding);

        let mut segments = vec![decode_header(header, &separators)];
        for (offset, line) in lines.enumerate() {
            segments.push(decode_segment(line, offset + 1, &separators)?);
        }

        tracing::debug!("Decoded message with {} segments", segments.len());
        Ok(Self {
            segments,
            separators,
        })
    }

    /// Decodes raw bytes, replacing invalid UTF-8 when `lenient` is set.
    pub fn from_bytes(raw: &[u8], lenient: bool) -> std::result::Result<Self, DecodeError> {
        match std::str::from_utf8(raw) {
            Ok(text) => Self::parse(text),
            Err(err) if lenient => {
                tracing::warn!("Message contains invalid UTF-8 ({err}), decoding lossily");
                Self::parse(&String::from_utf8_lossy(raw))
            }
            Err(err) => Err(DecodeError::Encoding {
                message: err.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for Message {
    type Err = DecodeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Message::parse(s)
    }
}

fn decode_header(line: &str, separators: &Separators) -> Segment {
    let mut pieces = line.split(separators.field);
    let code = pieces.next().unwrap_or("MSH").to_string();
    let encoding = pieces.next().unwrap_or_default();

    let mut fields = vec![
        Field::literal(separators.field.to_string()),
        Field::literal(encoding.to_string()),
    ];
    fields.extend(pieces.map(|p| Field::split(p, separators)));
    Segment::from_fields(code, fields)
}

fn decode_segment(
    line: &str,
    index: usize,
    separators: &Separators,
) -> std::result::Result<Segment, DecodeError> {
    let mut pieces = line.split(separators.field);
    let code = pieces.next().unwrap_or_default();
    if !is_segment_code(code) {
        return Err(DecodeError::InvalidSegment {
            index,
            code: code.to_string(),
        });
    }

    let fields = pieces.map(|p| Field::split(p, separators)).collect();
    Ok(Segment::from_fields(code.to_string(), fields))
}

pub(crate) fn is_segment_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 3
        && bytes[0].is_ascii_uppercase()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
