use std::fmt;

use serde::{Deserialize, Serialize};

use super::value::{ValueConstraint, is_truthy};
use crate::error::ConstraintViolation;

/// How a value relates to its constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Presence {
    /// `must be`: the value has to satisfy the constraint.
    Mandatory,
    /// `may be`: an empty value passes, anything else has to satisfy the constraint.
    Optional,
    /// `cannot be`: the value must not satisfy the constraint.
    Forbidden,
}

impl Presence {
    pub fn keyword(&self) -> &'static str {
        match self {
            Presence::Mandatory => "must be",
            Presence::Optional => "may be",
            Presence::Forbidden => "cannot be",
        }
    }
}

/// A value constraint combined with a presence policy.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub presence: Presence,
    pub constraint: ValueConstraint,
}

impl Predicate {
    pub fn new(presence: Presence, constraint: ValueConstraint) -> Self {
        Self {
            presence,
            constraint,
        }
    }

    pub fn mandatory(constraint: ValueConstraint) -> Self {
        Self::new(Presence::Mandatory, constraint)
    }

    pub fn optional(constraint: ValueConstraint) -> Self {
        Self::new(Presence::Optional, constraint)
    }

    pub fn forbidden(constraint: ValueConstraint) -> Self {
        Self::new(Presence::Forbidden, constraint)
    }

    /// Applies the presence policy to `value`.
    pub fn check<'a>(&self, value: &'a str) -> std::result::Result<&'a str, ConstraintViolation> {
        match self.presence {
            Presence::Mandatory => self.constraint.evaluate(value),
            Presence::Optional => {
                if is_truthy(value) {
                    self.constraint.evaluate(value)
                } else {
                    Ok(value)
                }
            }
            Presence::Forbidden => {
                // A value the constraint rejects (or no value at all) trivially
                // "cannot be" it; the inner violation is never surfaced.
                if is_truthy(value) && self.constraint.evaluate(value).is_ok() {
                    Err(ConstraintViolation::new(self.to_string(), value))
                } else {
                    Ok(value)
                }
            }
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.presence.keyword(), self.constraint)
    }
}
