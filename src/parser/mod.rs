//! Rule language parsing
//!
//! Rule text is parsed line by line into a [`RuleTree`], a flat list of declarations
//! that still holds raw tokens (selectors, literals, type names, cardinality tokens).
//! Giving those tokens meaning is the compiler's job.
//!
//! ```text
//! import "pkg://common/msh.rules"     // import
//! "MSH.9.1" must be "OML"             // field rule
//! "PID.8" may be one of "F", "M", "U" // field rule
//! "PV1.2" must be "I" if "PV1.3" is not empty
//! PID                                 // structure
//!   [PD1]
//!   NTE 0..n
//! ```

mod grammar;

pub use grammar::RuleLanguageParser;

use crate::error::CompileError;
use crate::types::Presence;

/// Turns rule text into a parse tree.
///
/// The default implementation is [`RuleLanguageParser`]; an alternative grammar can be
/// plugged into a [`Validator`](crate::Validator) and is then also used for imports.
pub trait RuleParser: Send + Sync {
    fn parse(&self, text: &str) -> std::result::Result<RuleTree, CompileError>;
}

/// Parsed rule text, one item per declaring line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleTree {
    pub items: Vec<RuleItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleItem {
    /// 1-based source line.
    pub line: usize,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemKind {
    /// `"<selector>" <predicate> [if "<selector>" is <target>]`
    FieldRule(FieldRuleDecl),
    /// `<indent><CODE> [<cardinality>]` or `<indent>[<CODE>] [<cardinality>]`
    Structure(StructureDecl),
    /// `import "<location>"`
    Import { location: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRuleDecl {
    pub selector: String,
    pub presence: Presence,
    pub target: Target,
    pub condition: Option<ConditionDecl>,
}

/// The `if "<selector>" is <target>` clause of a field rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionDecl {
    pub selector: String,
    pub target: Target,
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// Quoted literal, quotes removed and escapes resolved.
    Literal(String),
    /// `r"..."` pattern source.
    Regex(String),
    /// `one of "a", "b"`
    OneOf(Vec<String>),
    /// Bare type name (`int`, `string`, `any`, ...); checked by the compiler.
    TypeName(String),
    /// `not empty`
    NotEmpty,
    /// `empty`
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureDecl {
    /// Number of leading whitespace characters.
    pub indent: usize,
    pub code: String,
    /// Declared with `[CODE]` bracket sugar.
    pub bracketed: bool,
    pub cardinality: Option<String>,
}
