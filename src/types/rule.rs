use std::fmt;

use super::predicate::Predicate;
use super::selector::FieldSelector;
use crate::error::RuleError;
use crate::message::Message;

/// A field-level check: read one value, apply one predicate.
///
/// A rule compiled from an `if ... is ...` clause carries that clause as its
/// `test_rule`. The test rule is evaluated and logged on its own; it does not decide
/// whether the owning rule runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub selector: FieldSelector,
    pub predicate: Predicate,
    pub test_rule: Option<Box<ValidationRule>>,
    /// 1-based line of the declaration in its rule text.
    pub line: Option<usize>,
}

impl ValidationRule {
    pub fn new(selector: FieldSelector, predicate: Predicate) -> Self {
        Self {
            selector,
            predicate,
            test_rule: None,
            line: None,
        }
    }

    pub fn with_test_rule(mut self, test_rule: ValidationRule) -> Self {
        self.test_rule = Some(Box::new(test_rule));
        self
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// Resolves the selector against `message` and checks the value.
    pub fn evaluate(&self, message: &Message) -> std::result::Result<String, RuleError> {
        let value = self.selector.resolve(message)?;
        self.predicate.check(&value)?;
        Ok(value)
    }
}

impl fmt::Display for ValidationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" {}", self.selector, self.predicate)?;
        if let Some(test) = &self.test_rule {
            write!(f, " (if {test})")?;
        }
        Ok(())
    }
}
