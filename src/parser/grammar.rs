use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while1},
    character::complete::{anychar, char, satisfy, space0, space1},
    combinator::{all_consuming, cut, map, not, opt, recognize, rest, value},
    error::{ErrorKind, ParseError, VerboseError, VerboseErrorKind, context},
    multi::{many0, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
};

use super::{ConditionDecl, FieldRuleDecl, ItemKind, RuleItem, RuleParser, RuleTree, StructureDecl, Target};
use crate::error::CompileError;
use crate::types::Presence;

type Res<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

/// Line-oriented parser for the validation rule language.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleLanguageParser;

impl RuleLanguageParser {
    pub fn new() -> Self {
        Self
    }
}

impl RuleParser for RuleLanguageParser {
    fn parse(&self, text: &str) -> std::result::Result<RuleTree, CompileError> {
        let mut items = Vec::new();

        for (idx, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim_end_matches('\r');
            let body = line.trim_start_matches([' ', '\t']);
            let indent = line.len() - body.len();

            if body.trim().is_empty() || body.starts_with("//") {
                continue;
            }

            let kind = match all_consuming(terminated(|i| item(i, indent), trailer))(body) {
                Ok((_, kind)) => kind,
                Err(err) => {
                    return Err(CompileError::Parse {
                        line: idx + 1,
                        message: describe(body, indent, err),
                    });
                }
            };
            items.push(RuleItem {
                line: idx + 1,
                kind,
            });
        }

        tracing::debug!("Parsed {} rule items", items.len());
        Ok(RuleTree { items })
    }
}

fn item(input: &str, indent: usize) -> Res<'_, ItemKind> {
    if input.starts_with('"') {
        map(field_rule, ItemKind::FieldRule)(input)
    } else if input.starts_with("import") {
        import(input)
    } else {
        map(|i| structure(i, indent), ItemKind::Structure)(input)
    }
}

fn trailer(input: &str) -> Res<'_, ()> {
    value((), pair(space0, opt(preceded(tag("//"), rest))))(input)
}

// Field rules

fn field_rule(input: &str) -> Res<'_, FieldRuleDecl> {
    let (input, selector) = context("quoted selector", quoted)(input)?;
    let (input, _) = space1(input)?;
    let (input, (presence, target)) = cut(predicate)(input)?;
    let (input, condition) = opt(preceded(space1, condition))(input)?;

    Ok((
        input,
        FieldRuleDecl {
            selector,
            presence,
            target,
            condition,
        },
    ))
}

fn presence(input: &str) -> Res<'_, Presence> {
    context(
        "must be, may be or cannot be",
        alt((
            value(Presence::Mandatory, tuple((keyword("must"), space1, keyword("be")))),
            value(Presence::Optional, tuple((keyword("may"), space1, keyword("be")))),
            value(Presence::Forbidden, tuple((keyword("cannot"), space1, keyword("be")))),
        )),
    )(input)
}

fn predicate(input: &str) -> Res<'_, (Presence, Target)> {
    let (input, presence) = presence(input)?;
    let (input, _) = space1(input)?;
    let (input, target) = context("value, list, type name, empty or not empty", target)(input)?;
    Ok((input, (presence, target)))
}

fn target(input: &str) -> Res<'_, Target> {
    alt((
        map(regex_literal, Target::Regex),
        map(quoted, Target::Literal),
        keyword_target,
    ))(input)
}

fn keyword_target(input: &str) -> Res<'_, Target> {
    let (rest, word) = identifier(input)?;
    match word {
        "not" => value(Target::NotEmpty, preceded(space1, keyword("empty")))(rest),
        "empty" => Ok((rest, Target::Empty)),
        "one" => one_of(rest),
        _ => Ok((rest, Target::TypeName(word.to_string()))),
    }
}

fn one_of(input: &str) -> Res<'_, Target> {
    map(
        preceded(tuple((space1, keyword("of"), space1)), list),
        Target::OneOf,
    )(input)
}

fn condition(input: &str) -> Res<'_, ConditionDecl> {
    let (input, _) = keyword("if")(input)?;
    cut(condition_body)(input)
}

fn condition_body(input: &str) -> Res<'_, ConditionDecl> {
    let (input, _) = space1(input)?;
    let (input, selector) = context("quoted selector", quoted)(input)?;
    let (input, _) = context("is", tuple((space1, keyword("is"), space1)))(input)?;
    let (input, target) = context(
        "value, list, type <name>, empty or not empty",
        condition_target,
    )(input)?;
    Ok((input, ConditionDecl { selector, target }))
}

fn condition_target(input: &str) -> Res<'_, Target> {
    if let Ok((rest, pattern)) = regex_literal(input) {
        return Ok((rest, Target::Regex(pattern)));
    }
    if let Ok((rest, literal)) = quoted(input) {
        return Ok((rest, Target::Literal(literal)));
    }

    let (rest, word) = identifier(input)?;
    match word {
        "not" => value(Target::NotEmpty, preceded(space1, keyword("empty")))(rest),
        "empty" => Ok((rest, Target::Empty)),
        "one" => one_of(rest),
        "type" => map(preceded(space1, identifier), |name: &str| {
            Target::TypeName(name.to_string())
        })(rest),
        _ => Err(nom::Err::Error(VerboseError::from_error_kind(
            input,
            ErrorKind::Tag,
        ))),
    }
}

fn list(input: &str) -> Res<'_, Vec<String>> {
    separated_list1(tuple((space0, char(','), space0)), quoted)(input)
}

// Imports

fn import(input: &str) -> Res<'_, ItemKind> {
    let (input, _) = keyword("import")(input)?;
    let (input, location) = cut(preceded(space1, context("quoted import location", quoted)))(input)?;
    Ok((input, ItemKind::Import { location }))
}

// Structure

fn structure(input: &str, indent: usize) -> Res<'_, StructureDecl> {
    let (input, (code, bracketed)) = context(
        "segment code",
        alt((
            map(delimited(char('['), segment_token, cut(char(']'))), |c| (c, true)),
            map(segment_token, |c| (c, false)),
        )),
    )(input)?;
    let (input, cardinality) = opt(preceded(space1, cardinality_token))(input)?;

    Ok((
        input,
        StructureDecl {
            indent,
            code: code.to_string(),
            bracketed,
            cardinality: cardinality.map(str::to_string),
        },
    ))
}

fn segment_token(input: &str) -> Res<'_, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric())(input)
}

fn cardinality_token(input: &str) -> Res<'_, &str> {
    take_while1(|c: char| c.is_ascii_digit() || c == '.' || c == 'n' || c == '*')(input)
}

// Tokens

fn keyword<'a>(word: &'static str) -> impl FnMut(&'a str) -> Res<'a, &'a str> {
    terminated(tag(word), not(satisfy(|c| c.is_alphanumeric() || c == '_')))
}

fn identifier(input: &str) -> Res<'_, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn quoted_raw(input: &str) -> Res<'_, &str> {
    delimited(
        char('"'),
        recognize(many0(alt((
            recognize(pair(char('\\'), anychar)),
            is_not("\\\""),
        )))),
        char('"'),
    )(input)
}

fn quoted(input: &str) -> Res<'_, String> {
    map(quoted_raw, unescape_literal)(input)
}

fn regex_literal(input: &str) -> Res<'_, String> {
    preceded(char('r'), map(quoted_raw, |raw| raw.replace("\\\"", "\"")))(input)
}

fn unescape_literal(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(escaped @ ('"' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn describe(body: &str, indent: usize, err: nom::Err<VerboseError<&str>>) -> String {
    let err = match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => return "incomplete input".to_string(),
    };

    let remaining = err.errors.first().map(|(at, _)| *at).unwrap_or(body);
    let column = indent + body.len() - remaining.len() + 1;
    let found = if remaining.is_empty() {
        "end of line".to_string()
    } else {
        format!("'{}'", remaining.chars().take(24).collect::<String>())
    };

    let expected = err.errors.iter().find_map(|(_, kind)| match kind {
        VerboseErrorKind::Context(what) => Some(*what),
        _ => None,
    });

    match expected {
        Some(what) => format!("expected {what} at column {column}, found {found}"),
        None => format!("unexpected {found} at column {column}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> RuleTree {
        RuleLanguageParser::new().parse(text).unwrap()
    }

    fn single(text: &str) -> ItemKind {
        let mut tree = parse(text);
        assert_eq!(tree.items.len(), 1, "expected one item in {text:?}");
        tree.items.remove(0).kind
    }

    #[test]
    fn test_field_rule_literal() {
        let ItemKind::FieldRule(rule) = single(r#" "MSH.9.1.1" must be "OML""#) else {
            panic!("expected field rule");
        };
        assert_eq!(rule.selector, "MSH.9.1.1");
        assert_eq!(rule.presence, Presence::Mandatory);
        assert_eq!(rule.target, Target::Literal("OML".to_string()));
        assert!(rule.condition.is_none());
    }

    #[test]
    fn test_field_rule_targets() {
        let cases = [
            (r#""A.1" must be string"#, Target::TypeName("string".into())),
            (r#""A.1" must be not empty"#, Target::NotEmpty),
            (r#""A.1" must be empty"#, Target::Empty),
            (r#""A.1" may be r"[0-9]+""#, Target::Regex("[0-9]+".into())),
            (
                r#""A.1" cannot be one of "Test", "Value""#,
                Target::OneOf(vec!["Test".into(), "Value".into()]),
            ),
            (
                r#""A.1" must be one of "Lab1","Lab2" , "Lab3""#,
                Target::OneOf(vec!["Lab1".into(), "Lab2".into(), "Lab3".into()]),
            ),
        ];
        for (text, expected) in cases {
            let ItemKind::FieldRule(rule) = single(text) else {
                panic!("expected field rule for {text}");
            };
            assert_eq!(rule.target, expected, "{text}");
        }
    }

    #[test]
    fn test_condition_clause() {
        let ItemKind::FieldRule(rule) = single(r#""MSH.3.3" must be int if "MSH.4" is not empty"#)
        else {
            panic!("expected field rule");
        };
        let condition = rule.condition.unwrap();
        assert_eq!(condition.selector, "MSH.4");
        assert_eq!(condition.target, Target::NotEmpty);

        let ItemKind::FieldRule(rule) = single(r#""A.1" must be "x" if "B.1" is type int"#) else {
            panic!("expected field rule");
        };
        assert_eq!(rule.condition.unwrap().target, Target::TypeName("int".into()));
    }

    #[test]
    fn test_condition_rejects_bare_type_name() {
        let err = RuleLanguageParser::new()
            .parse(r#""A.1" must be "x" if "B.1" is int"#)
            .unwrap_err();
        assert!(matches!(err, CompileError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_escaped_quotes() {
        let ItemKind::FieldRule(rule) = single(r#""A.1" must be "say \"hi\"""#) else {
            panic!("expected field rule");
        };
        assert_eq!(rule.target, Target::Literal("say \"hi\"".to_string()));
    }

    #[test]
    fn test_structure_lines() {
        let tree = parse("MSH\nPID 1..n\n  [PD1]\n\tNTE 0..n // notes\n");
        let decls: Vec<StructureDecl> = tree
            .items
            .into_iter()
            .map(|item| match item.kind {
                ItemKind::Structure(decl) => decl,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(decls[0].code, "MSH");
        assert_eq!(decls[0].cardinality, None);
        assert_eq!(decls[1].cardinality.as_deref(), Some("1..n"));
        assert_eq!(decls[2].indent, 2);
        assert!(decls[2].bracketed);
        assert_eq!(decls[3].indent, 1);
        assert_eq!(decls[3].cardinality.as_deref(), Some("0..n"));
    }

    #[test]
    fn test_import_and_comments() {
        let tree = parse("// header\n\nimport \"file:///tmp/base.rules\"\r\n\"A.1\" must be int // trailing\n");
        assert_eq!(tree.items.len(), 2);
        assert_eq!(tree.items[0].line, 3);
        assert_eq!(
            tree.items[0].kind,
            ItemKind::Import {
                location: "file:///tmp/base.rules".to_string()
            }
        );
        assert_eq!(tree.items[1].line, 4);
    }

    #[test]
    fn test_parse_error_reports_line_and_expectation() {
        let err = RuleLanguageParser::new()
            .parse("\"A.1\" must be int\n\"A.2\" should be int\n")
            .unwrap_err();
        match err {
            CompileError::Parse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("must be, may be or cannot be"), "{message}");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(RuleLanguageParser::new().parse("PID 1 extra").is_err());
        assert!(RuleLanguageParser::new().parse("[PID").is_err());
    }
}
