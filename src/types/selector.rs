use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::error::LookupFailure;
use crate::message::Message;

// SEG[occ].FIELD[rep].COMPONENT.SUBCOMPONENT
static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([A-Z][A-Z0-9]{2})(?:\[([1-9][0-9]*)\])?\.([1-9][0-9]*)(?:\[([1-9][0-9]*)\])?(?:\.([1-9][0-9]*))?(?:\.([1-9][0-9]*))?$",
    )
    .expect("field path pattern is valid")
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector '{0}'")]
pub struct InvalidSelector(pub String);

/// Dotted path to a scalar inside a message, e.g. `MSH.9.1` or `PID[2].3[1].4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    path: String,
    segment: String,
    occurrence: usize,
    field: usize,
    repetition: usize,
    component: usize,
    subcomponent: usize,
}

impl FieldSelector {
    pub fn new(path: &str) -> std::result::Result<Self, InvalidSelector> {
        let caps = FIELD_PATH
            .captures(path)
            .ok_or_else(|| InvalidSelector(path.to_string()))?;

        let position = |idx: usize| -> std::result::Result<usize, InvalidSelector> {
            match caps.get(idx) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| InvalidSelector(path.to_string())),
                None => Ok(1),
            }
        };

        Ok(Self {
            path: path.to_string(),
            segment: caps[1].to_string(),
            occurrence: position(2)?,
            field: position(3)?,
            repetition: position(4)?,
            component: position(5)?,
            subcomponent: position(6)?,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segment_code(&self) -> &str {
        &self.segment
    }

    /// Reads the addressed value.
    ///
    /// An absent segment or an omitted trailing position reads as `""`; a path that
    /// descends into a value without that structure is a [`LookupFailure`].
    pub fn resolve(&self, message: &Message) -> std::result::Result<String, LookupFailure> {
        let Some(segment) = message.segment(&self.segment, self.occurrence) else {
            tracing::trace!("Segment {} not present, {} reads empty", self.segment, self.path);
            return Ok(String::new());
        };

        segment
            .extract(
                self.field,
                self.repetition,
                self.component,
                self.subcomponent,
                message.separators(),
            )
            .map_err(|reason| LookupFailure::new(&self.path, reason))
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A bare segment code such as `PID` or `ZE1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SegmentSelector {
    code: String,
}

impl SegmentSelector {
    pub fn new(code: &str) -> std::result::Result<Self, InvalidSelector> {
        if crate::message::is_segment_code(code) {
            Ok(Self {
                code: code.to_string(),
            })
        } else {
            Err(InvalidSelector(code.to_string()))
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn matches(&self, segment_code: &str) -> bool {
        self.code == segment_code
    }
}

impl fmt::Display for SegmentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}
