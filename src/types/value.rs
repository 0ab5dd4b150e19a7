use std::fmt;

use regex::Regex;

use crate::error::ConstraintViolation;

/// Atomic rule a scalar value must (or must not) satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueConstraint {
    /// Exact equality with a de-quoted literal.
    Const(String),
    /// Membership in a set of de-quoted literals.
    OneOf(Vec<String>),
    /// Any string, always succeeds.
    TypeString,
    /// A base-10 integer.
    TypeInt,
    /// Any non-empty value.
    TypeAny,
    /// A pattern that must match at the start of the value.
    Regexp(Pattern),
}

impl ValueConstraint {
    pub fn constant(literal: impl AsRef<str>) -> Self {
        ValueConstraint::Const(dequote(literal.as_ref()).to_string())
    }

    pub fn one_of<I, S>(literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ValueConstraint::OneOf(
            literals
                .into_iter()
                .map(|l| dequote(l.as_ref()).to_string())
                .collect(),
        )
    }

    pub fn regexp(pattern: &str) -> std::result::Result<Self, regex::Error> {
        Pattern::new(pattern).map(ValueConstraint::Regexp)
    }

    /// Maps a rule-language type name (`int`, `string`, `any`) to its constraint.
    pub fn for_type_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ValueConstraint::TypeInt),
            "string" => Some(ValueConstraint::TypeString),
            "any" => Some(ValueConstraint::TypeAny),
            _ => None,
        }
    }

    /// Checks `raw`, handing it back unchanged on success.
    pub fn evaluate<'a>(&self, raw: &'a str) -> std::result::Result<&'a str, ConstraintViolation> {
        let ok = match self {
            ValueConstraint::Const(expected) => raw == expected,
            ValueConstraint::OneOf(values) => values.iter().any(|v| v == raw),
            ValueConstraint::TypeString => true,
            ValueConstraint::TypeInt => is_integer(raw),
            ValueConstraint::TypeAny => is_truthy(raw),
            ValueConstraint::Regexp(pattern) => pattern.matches_prefix(raw),
        };

        if ok {
            Ok(raw)
        } else {
            Err(ConstraintViolation::new(self.to_string(), raw))
        }
    }
}

impl fmt::Display for ValueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueConstraint::Const(value) => write!(f, "\"{value}\""),
            ValueConstraint::OneOf(values) => {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{v}\"")).collect();
                write!(f, "one of {}", quoted.join(", "))
            }
            ValueConstraint::TypeString => f.write_str("string"),
            ValueConstraint::TypeInt => f.write_str("int"),
            ValueConstraint::TypeAny => f.write_str("not empty"),
            ValueConstraint::Regexp(pattern) => write!(f, "r\"{}\"", pattern.as_str()),
        }
    }
}

/// Compiled regular expression that keeps its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    anchored: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> std::result::Result<Self, regex::Error> {
        // Anchor at the start only; trailing input is allowed.
        let anchored = Regex::new(&format!(r"\A(?:{source})"))?;
        Ok(Self {
            source: source.to_string(),
            anchored,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches_prefix(&self, value: &str) -> bool {
        self.anchored.is_match(value)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Empty values are falsy, everything else is truthy.
pub fn is_truthy(value: &str) -> bool {
    !value.is_empty()
}

fn is_integer(value: &str) -> bool {
    let trimmed = value.trim();
    let digits = trimmed
        .strip_prefix('+')
        .or_else(|| trimmed.strip_prefix('-'))
        .unwrap_or(trimmed);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn dequote(literal: &str) -> &str {
    literal.trim_matches('"')
}
