use std::fmt;

use serde::{Deserialize, Serialize};

use crate::message::{Message, Segment};
use crate::types::{StructureNode, ValidationRule, ViolationKind};

/// One entry of the validation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub message: String,
    /// Rendering of the rule or structure node that produced this entry.
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Set for structural violations only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<ViolationKind>,
    pub is_error: bool,
}

impl Outcome {
    pub fn rule_ok(rule: &ValidationRule) -> Self {
        Self {
            message: format!("Rule {rule}: ok"),
            rule: rule.to_string(),
            selector: Some(rule.selector.path().to_string()),
            value: None,
            tag: None,
            is_error: false,
        }
    }

    pub fn rule_error(rule: &ValidationRule, message: impl Into<String>, value: Option<String>) -> Self {
        Self {
            message: message.into(),
            rule: rule.to_string(),
            selector: Some(rule.selector.path().to_string()),
            value,
            tag: None,
            is_error: true,
        }
    }

    pub fn structure_ok(node: &StructureNode) -> Self {
        Self {
            message: format!("Structure {node}: ok"),
            rule: node.to_string(),
            selector: Some(node.code().to_string()),
            value: None,
            tag: None,
            is_error: false,
        }
    }

    pub fn structure_error(node: &StructureNode, kind: ViolationKind, count: usize) -> Self {
        Self {
            message: format!(
                "{kind} segment {} (expected {}, found {count})",
                node.code(),
                node.cardinality
            ),
            rule: node.to_string(),
            selector: Some(node.code().to_string()),
            value: None,
            tag: Some(kind),
            is_error: true,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {}", self.message, self.rule)
    }
}

/// Append-only, ordered list of outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeLog {
    entries: Vec<Outcome>,
}

impl OutcomeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: Outcome) {
        if outcome.is_error {
            tracing::debug!("{}", outcome);
        } else {
            tracing::trace!("{}", outcome);
        }
        self.entries.push(outcome);
    }

    pub fn entries(&self) -> &[Outcome] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.entries.iter()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Outcome> {
        self.entries.iter().filter(|o| o.is_error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Result of one validation run: the message under test and everything logged
/// while checking it.
#[derive(Debug, Clone)]
pub struct Context {
    message: Message,
    log: OutcomeLog,
}

impl Context {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            log: OutcomeLog::new(),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    /// Every outcome in the order it was produced.
    pub fn log(&self) -> &[Outcome] {
        self.log.entries()
    }

    pub fn errors(&self) -> Vec<&Outcome> {
        self.log.errors().collect()
    }

    /// True when no outcome is an error.
    pub fn is_valid(&self) -> bool {
        self.log.errors().next().is_none()
    }

    pub fn report(&self) -> ValidationReport {
        ValidationReport {
            valid: self.is_valid(),
            error_count: self.log.error_count(),
            outcomes: self.log.entries().to_vec(),
        }
    }

    /// Full-message view for the structural pass.
    pub(crate) fn scope(&mut self) -> Scope<'_> {
        Scope {
            view: self.message.segments(),
            log: &mut self.log,
        }
    }

    pub(crate) fn parts(&mut self) -> (&Message, &mut OutcomeLog) {
        (&self.message, &mut self.log)
    }
}

/// A narrowed view of the message sharing the run's log.
pub(crate) struct Scope<'a> {
    view: &'a [Segment],
    log: &'a mut OutcomeLog,
}

impl<'a> Scope<'a> {
    pub(crate) fn view(&self) -> &'a [Segment] {
        self.view
    }

    pub(crate) fn log(&mut self) -> &mut OutcomeLog {
        self.log
    }

    /// Child scope over `view`, appending to the same log.
    pub(crate) fn derive<'b>(&'b mut self, view: &'b [Segment]) -> Scope<'b> {
        Scope {
            view,
            log: &mut *self.log,
        }
    }
}

/// Serializable summary of a [`Context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub error_count: usize,
    pub outcomes: Vec<Outcome>,
}
