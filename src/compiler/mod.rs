//! Rule compiler
//!
//! Walks a [`RuleTree`] and produces the field-level [`ValidationRule`]s and the
//! segment [`StructureForest`]. Imports are compiled recursively with the same parser
//! and spliced in at the position they were declared.

pub mod import;

pub use import::{FileSystemLoader, ImportLocation, MemoryLoader, ResourceLoader};

use crate::error::{CompileError, ImportError};
use crate::parser::{FieldRuleDecl, ItemKind, RuleParser, RuleTree, StructureDecl, Target};
use crate::types::{
    Cardinality, FieldSelector, Predicate, Presence, SegmentSelector, StructureForest,
    StructureNode, ValidationRule, ValueConstraint,
};

pub const DEFAULT_MAX_IMPORT_DEPTH: usize = 16;

/// Output of compiling one rule set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledRules {
    rules: Vec<ValidationRule>,
    structure: StructureForest,
}

impl CompiledRules {
    /// Field rules in declaration order, imported rules inlined where imported.
    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    /// The whole structure forest.
    pub fn forest(&self) -> &StructureForest {
        &self.structure
    }

    /// Root structure nodes in declaration order.
    pub fn structure(&self) -> Vec<&StructureNode> {
        self.structure
            .roots()
            .iter()
            .map(|id| self.structure.node(*id))
            .collect()
    }

    fn append(&mut self, other: CompiledRules) {
        self.rules.extend(other.rules);
        self.structure.splice(other.structure);
    }
}

pub struct RuleCompiler<'a> {
    parser: &'a dyn RuleParser,
    loader: &'a dyn ResourceLoader,
    max_import_depth: usize,
}

impl<'a> RuleCompiler<'a> {
    pub fn new(parser: &'a dyn RuleParser, loader: &'a dyn ResourceLoader) -> Self {
        Self {
            parser,
            loader,
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
        }
    }

    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    /// Parses and compiles rule text.
    pub fn compile(&self, text: &str) -> std::result::Result<CompiledRules, CompileError> {
        self.compile_text(text, 0)
    }

    /// Compiles an already parsed tree.
    pub fn compile_tree(&self, tree: &RuleTree) -> std::result::Result<CompiledRules, CompileError> {
        self.compile_items(tree, 0)
    }

    fn compile_text(
        &self,
        text: &str,
        depth: usize,
    ) -> std::result::Result<CompiledRules, CompileError> {
        let tree = self.parser.parse(text)?;
        self.compile_items(&tree, depth)
    }

    fn compile_items(
        &self,
        tree: &RuleTree,
        depth: usize,
    ) -> std::result::Result<CompiledRules, CompileError> {
        let mut compiled = CompiledRules::default();

        for item in &tree.items {
            match &item.kind {
                ItemKind::FieldRule(decl) => {
                    compiled.rules.push(field_rule(decl, item.line)?);
                }
                ItemKind::Structure(decl) => {
                    declare_segment(&mut compiled.structure, decl, item.line)?;
                }
                ItemKind::Import { location } => {
                    let imported = self.import(location, depth)?;
                    compiled.append(imported);
                }
            }
        }

        tracing::debug!(
            "Compiled {} rules and {} structure nodes at import depth {}",
            compiled.rules.len(),
            compiled.structure.len(),
            depth
        );
        Ok(compiled)
    }

    fn import(
        &self,
        location: &str,
        depth: usize,
    ) -> std::result::Result<CompiledRules, CompileError> {
        if depth >= self.max_import_depth {
            return Err(ImportError::DepthExceeded {
                location: location.to_string(),
                limit: self.max_import_depth,
            }
            .into());
        }

        let target = ImportLocation::parse(location)?;
        tracing::info!("Importing {}", target);
        let text = self.loader.load(&target)?;

        let imported = self.compile_text(&text, depth + 1).map_err(|err| match err {
            CompileError::Import(_) => err,
            other => CompileError::Import(ImportError::Nested {
                location: location.to_string(),
                source: Box::new(other),
            }),
        })?;

        tracing::info!(
            "Imported {} rules, {} structure roots from {}",
            imported.rules.len(),
            imported.structure.roots().len(),
            target
        );
        Ok(imported)
    }
}

fn field_rule(
    decl: &FieldRuleDecl,
    line: usize,
) -> std::result::Result<ValidationRule, CompileError> {
    let selector = field_selector(&decl.selector, line)?;
    let predicate = rule_predicate(decl.presence, &decl.target, line)?;
    let mut rule = ValidationRule::new(selector, predicate).with_line(line);

    if let Some(condition) = &decl.condition {
        let test_selector = field_selector(&condition.selector, line)?;
        let test_predicate = condition_predicate(&condition.target, line)?;
        rule = rule.with_test_rule(ValidationRule::new(test_selector, test_predicate).with_line(line));
    }
    Ok(rule)
}

fn field_selector(path: &str, line: usize) -> std::result::Result<FieldSelector, CompileError> {
    FieldSelector::new(path).map_err(|_| CompileError::InvalidSelector {
        line,
        selector: path.to_string(),
    })
}

/// Constraint for targets whose meaning does not depend on the presence keyword.
fn value_constraint(
    target: &Target,
    line: usize,
) -> std::result::Result<Option<ValueConstraint>, CompileError> {
    let constraint = match target {
        Target::Literal(value) => ValueConstraint::constant(value),
        Target::OneOf(values) => ValueConstraint::one_of(values),
        Target::Regex(pattern) => {
            ValueConstraint::regexp(pattern).map_err(|source| CompileError::InvalidPattern {
                line,
                pattern: pattern.clone(),
                source,
            })?
        }
        Target::TypeName(name) => {
            ValueConstraint::for_type_name(name).ok_or_else(|| CompileError::UnknownType {
                line,
                name: name.clone(),
            })?
        }
        Target::NotEmpty | Target::Empty => return Ok(None),
    };
    Ok(Some(constraint))
}

fn rule_predicate(
    presence: Presence,
    target: &Target,
    line: usize,
) -> std::result::Result<Predicate, CompileError> {
    if let Some(constraint) = value_constraint(target, line)? {
        return Ok(Predicate::new(presence, constraint));
    }

    let any = ValueConstraint::TypeAny;
    Ok(match (presence, target) {
        (Presence::Mandatory, Target::Empty) => Predicate::forbidden(any),
        (Presence::Forbidden, Target::Empty) => Predicate::mandatory(any),
        (Presence::Optional, _) => Predicate::optional(any),
        (presence, _) => Predicate::new(presence, any),
    })
}

fn condition_predicate(target: &Target, line: usize) -> std::result::Result<Predicate, CompileError> {
    Ok(match target {
        Target::Empty => Predicate::forbidden(ValueConstraint::TypeAny),
        Target::NotEmpty => Predicate::mandatory(ValueConstraint::TypeAny),
        Target::OneOf(values) => Predicate::optional(ValueConstraint::one_of(values)),
        other => match value_constraint(other, line)? {
            Some(constraint) => Predicate::mandatory(constraint),
            None => Predicate::mandatory(ValueConstraint::TypeAny),
        },
    })
}

fn declare_segment(
    forest: &mut StructureForest,
    decl: &StructureDecl,
    line: usize,
) -> std::result::Result<(), CompileError> {
    let selector = SegmentSelector::new(&decl.code).map_err(|_| CompileError::InvalidSelector {
        line,
        selector: decl.code.clone(),
    })?;

    let cardinality = match &decl.cardinality {
        Some(token) => token
            .parse::<Cardinality>()
            .map_err(|_| CompileError::InvalidCardinality {
                line,
                token: token.clone(),
            })?,
        None if decl.bracketed => Cardinality::AtMostOne,
        None => Cardinality::ExactlyOne,
    };

    forest.declare(selector, decl.indent, cardinality, Some(line));
    Ok(())
}
