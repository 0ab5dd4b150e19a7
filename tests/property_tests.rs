//! Property-based tests for rule compilation and validation.
//!
//! Uses proptest to generate rule sets and messages and verify:
//! - One compiled rule per field-rule line
//! - Forbidden predicates never reject values the constraint does not describe
//! - Cardinality checks agree with plain occurrence counts
//! - Validation is deterministic

mod common;

use common::*;
use octofhir_hl7validator::*;
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn segment_code() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9]{2}"
}

fn field_path() -> impl Strategy<Value = String> {
    (
        segment_code(),
        1usize..30,
        prop::option::of(1usize..6),
        prop::option::of(1usize..4),
    )
        .prop_map(|(code, field, component, sub)| {
            let mut path = format!("{code}.{field}");
            if let Some(component) = component {
                path.push_str(&format!(".{component}"));
                if let Some(sub) = sub {
                    path.push_str(&format!(".{sub}"));
                }
            }
            path
        })
}

fn literal() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 _.-]{0,10}".prop_map(|s| format!("\"{s}\""))
}

fn target() -> impl Strategy<Value = String> {
    prop_oneof![
        literal(),
        Just("int".to_string()),
        Just("string".to_string()),
        Just("any".to_string()),
        Just("empty".to_string()),
        Just("not empty".to_string()),
        Just("r\"[A-Z]+\"".to_string()),
        prop::collection::vec(literal(), 1..4).prop_map(|v| format!("one of {}", v.join(", "))),
    ]
}

fn condition_target() -> impl Strategy<Value = String> {
    prop_oneof![
        literal(),
        Just("empty".to_string()),
        Just("not empty".to_string()),
        Just("type int".to_string()),
        prop::collection::vec(literal(), 1..3).prop_map(|v| format!("one of {}", v.join(", "))),
    ]
}

fn field_rule_line() -> impl Strategy<Value = String> {
    (
        field_path(),
        prop_oneof![Just("must be"), Just("may be"), Just("cannot be")],
        target(),
        prop::option::of((field_path(), condition_target())),
    )
        .prop_map(|(path, presence, target, condition)| {
            let mut line = format!("\"{path}\" {presence} {target}");
            if let Some((test_path, test_target)) = condition {
                line.push_str(&format!(" if \"{test_path}\" is {test_target}"));
            }
            line
        })
}

/// Lines that never produce a field rule.
fn filler_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("// comment".to_string()),
        segment_code(),
        segment_code().prop_map(|c| format!("  [{c}]")),
        segment_code().prop_map(|c| format!("    {c} 0..n // nested")),
    ]
}

fn rule_set() -> impl Strategy<Value = (usize, String)> {
    prop::collection::vec(
        prop_oneof![
            3 => field_rule_line().prop_map(|l| (true, l)),
            1 => filler_line().prop_map(|l| (false, l)),
        ],
        0..25,
    )
    .prop_map(|lines| {
        let count = lines.iter().filter(|(is_rule, _)| *is_rule).count();
        let text = lines
            .into_iter()
            .map(|(_, line)| line)
            .collect::<Vec<_>>()
            .join("\n");
        (count, text)
    })
}

fn non_numeric() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 ]{0,10}"
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Every field-rule line compiles to exactly one rule
    #[test]
    fn prop_one_rule_per_field_line((count, text) in rule_set()) {
        let compiled = Validator::new(text.as_str()).compile();
        prop_assert!(compiled.is_ok(), "{:?}\n{}", compiled.as_ref().err(), text);
        prop_assert_eq!(compiled.unwrap().rules().len(), count);
    }

    /// A present value equal to the forbidden constant is rejected, anything else passes
    #[test]
    fn prop_forbidden_constant(forbidden in "[A-Za-z0-9]{1,8}", other in "[A-Za-z0-9]{0,8}") {
        let predicate = Predicate::forbidden(ValueConstraint::Const(forbidden.clone()));
        prop_assert!(predicate.check(&forbidden).is_err());
        if other != forbidden {
            prop_assert!(predicate.check(&other).is_ok());
        }
    }

    /// "cannot be int" holds for every value that is not an integer
    #[test]
    fn prop_forbidden_int(value in non_numeric(), number in any::<i64>()) {
        let predicate = Predicate::forbidden(ValueConstraint::TypeInt);
        prop_assert!(predicate.check(&value).is_ok());
        prop_assert!(predicate.check(&number.to_string()).is_err());
    }

    /// Optional predicates accept an empty value whatever the constraint
    #[test]
    fn prop_optional_accepts_empty(expected in "[A-Za-z0-9]{1,8}") {
        let constraints = [
            ValueConstraint::Const(expected.clone()),
            ValueConstraint::OneOf(vec![expected]),
            ValueConstraint::TypeInt,
            ValueConstraint::TypeAny,
        ];
        for constraint in constraints {
            prop_assert!(Predicate::optional(constraint).check("").is_ok());
        }
    }

    /// An exactly-one segment is missing for zero occurrences and too many for two or more
    #[test]
    fn prop_exactly_one_matches_count(occurrences in 0usize..5, padding in 0usize..3) {
        let mut codes = vec!["MSH"];
        codes.extend(std::iter::repeat_n("NTE", padding));
        codes.extend(std::iter::repeat_n("PID", occurrences));

        let context = validate("PID", segments(&codes));
        let expected = match occurrences {
            0 => vec![ViolationKind::Missing],
            1 => vec![],
            _ => vec![ViolationKind::TooMany],
        };
        prop_assert_eq!(error_tags(&context), expected);
    }

    /// Repeated validation of the same message yields the same log
    #[test]
    fn prop_validation_is_deterministic((_, text) in rule_set()) {
        let validator = Validator::new(text);
        let first = validator.validate(lab_order()).unwrap();
        let second = validator.validate(lab_order()).unwrap();

        prop_assert_eq!(first.log(), second.log());
        prop_assert_eq!(first.is_valid(), second.is_valid());
    }

    /// Each field rule and each nested test rule logs exactly one outcome
    #[test]
    fn prop_one_outcome_per_rule((_, text) in rule_set()) {
        let compiled = Validator::new(text).compile().unwrap();
        let expected_rules: usize = compiled
            .rules()
            .iter()
            .map(|r| 1 + usize::from(r.test_rule.is_some()))
            .sum();

        let context = validate_compiled(&compiled, lab_order());
        let field_outcomes = context
            .log()
            .iter()
            .filter(|o| o.tag.is_none() && !o.message.starts_with("Structure "))
            .count();
        prop_assert_eq!(field_outcomes, expected_rules);
    }
}
