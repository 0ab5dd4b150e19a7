//! HL7 v2 message model
//!
//! A [`Message`] is an ordered list of [`Segment`]s. Each segment keeps its fields
//! split into repetitions, components and subcomponents, with values stored as they
//! appear on the wire; unescaping happens on lookup.

mod decode;

pub use decode::Separators;
pub(crate) use decode::is_segment_code;

use std::fmt;

/// Ordered sequence of segments decoded from one HL7 message.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    segments: Vec<Segment>,
    separators: Separators,
}

impl Message {
    /// Builds a message from already split segments, using default separators.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self {
            segments,
            separators: Separators::default(),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn separators(&self) -> &Separators {
        &self.separators
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the `occurrence`-th (1-based) segment with the given code.
    pub fn segment(&self, code: &str, occurrence: usize) -> Option<&Segment> {
        self.segments
            .iter()
            .filter(|s| s.code == code)
            .nth(occurrence.checked_sub(1)?)
    }

    /// Number of segments carrying `code`.
    pub fn count(&self, code: &str) -> usize {
        count_code(&self.segments, code)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.segments.iter().map(|s| s.code()).collect();
        write!(f, "[{}]", codes.join(", "))
    }
}

pub(crate) fn count_code(segments: &[Segment], code: &str) -> usize {
    segments.iter().filter(|s| s.code == code).count()
}

/// One record of a message, identified by its leading code.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    code: String,
    fields: Vec<Field>,
}

impl Segment {
    /// Creates a segment from its code and raw field values (field 1 first).
    ///
    /// Values are taken literally; no separator splitting is performed.
    pub fn new<I, S>(code: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            code: code.into(),
            fields: fields.into_iter().map(|v| Field::literal(v.into())).collect(),
        }
    }

    pub(crate) fn from_fields(code: String, fields: Vec<Field>) -> Self {
        Self { code, fields }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Extracts a scalar at 1-based `field.repetition.component.subcomponent`.
    ///
    /// Positions past the end resolve to `""` as long as every deeper position is 1
    /// (an omitted trailing value); otherwise the path does not fit the segment.
    pub fn extract(
        &self,
        field: usize,
        repetition: usize,
        component: usize,
        subcomponent: usize,
        separators: &Separators,
    ) -> std::result::Result<String, String> {
        if field == 0 || repetition == 0 || component == 0 || subcomponent == 0 {
            return Err("positions are 1-based".to_string());
        }

        let Some(value) = self.fields.get(field - 1) else {
            return absent(
                repetition == 1 && component == 1 && subcomponent == 1,
                format!("segment {} has only {} fields", self.code, self.fields.len()),
            );
        };

        if value.literal {
            return if repetition == 1 && component == 1 && subcomponent == 1 {
                Ok(value.raw.clone())
            } else {
                Err(format!("{}.{field} has no components", self.code))
            };
        }

        let Some(rep) = value.repetitions.get(repetition - 1) else {
            return absent(
                component == 1 && subcomponent == 1,
                format!("{}.{field} has no repetition {repetition}", self.code),
            );
        };

        let Some(comp) = rep.get(component - 1) else {
            return absent(
                subcomponent == 1,
                format!("{}.{field} has no component {component}", self.code),
            );
        };

        match comp.get(subcomponent - 1) {
            Some(sub) => Ok(separators.unescape(sub)),
            None => Err(format!(
                "{}.{field}.{component} has no subcomponent {subcomponent}",
                self.code
            )),
        }
    }
}

fn absent(omitted: bool, reason: String) -> std::result::Result<String, String> {
    if omitted { Ok(String::new()) } else { Err(reason) }
}

/// A field split into repetitions, components and subcomponents.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    raw: String,
    repetitions: Vec<Vec<Vec<String>>>,
    // MSH.1 / MSH.2 and programmatic values are never split or unescaped
    literal: bool,
}

impl Field {
    pub(crate) fn literal(raw: String) -> Self {
        Self {
            repetitions: vec![vec![vec![raw.clone()]]],
            raw,
            literal: true,
        }
    }

    pub(crate) fn split(raw: &str, separators: &Separators) -> Self {
        let repetitions = raw
            .split(separators.repetition)
            .map(|rep| {
                rep.split(separators.component)
                    .map(|comp| {
                        comp.split(separators.subcomponent)
                            .map(str::to_string)
                            .collect()
                    })
                    .collect()
            })
            .collect();

        Self {
            raw: raw.to_string(),
            repetitions,
            literal: false,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}
