//! Field pass

use super::context::{Outcome, OutcomeLog};
use crate::error::RuleError;
use crate::message::Message;
use crate::types::ValidationRule;

/// Evaluates every rule against the full message, logging one outcome per rule
/// (plus one per nested test rule). A failing rule never stops the pass.
pub(crate) fn check_fields(rules: &[ValidationRule], message: &Message, log: &mut OutcomeLog) {
    for rule in rules {
        tracing::info!("Validating {} in payload", rule);
        apply(rule, message, log);
    }
}

fn apply(rule: &ValidationRule, message: &Message, log: &mut OutcomeLog) {
    if let Some(test) = &rule.test_rule {
        apply(test, message, log);
    }

    let outcome = match rule.evaluate(message) {
        Ok(_) => Outcome::rule_ok(rule),
        Err(RuleError::Violation(violation)) => Outcome::rule_error(
            rule,
            format!(
                "validation error for {} value {}",
                rule.selector, violation.value
            ),
            Some(violation.value),
        ),
        Err(RuleError::Lookup(failure)) => Outcome::rule_error(
            rule,
            format!("selector error for {}: {}", failure.selector, failure.reason),
            None,
        ),
    };
    log.push(outcome);
}
