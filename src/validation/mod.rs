//! Validation engine
//!
//! Runs compiled rules against a message in two passes that share one
//! [`Context`]: the structural pass over the segment forest, then the field pass
//! over every field rule in declaration order.

mod context;
mod fields;
mod structure;

pub use context::{Context, Outcome, OutcomeLog, ValidationReport};

use crate::compiler::CompiledRules;
use crate::message::Message;

/// Validates `message` against already compiled rules.
pub fn validate_compiled(compiled: &CompiledRules, message: Message) -> Context {
    let mut context = Context::new(message);

    structure::check_structure(compiled.forest(), &mut context);

    let (message, log) = context.parts();
    fields::check_fields(compiled.rules(), message, log);

    tracing::debug!(
        "Validation finished: {} outcomes, {} errors",
        context.log().len(),
        context.errors().len()
    );
    context
}
