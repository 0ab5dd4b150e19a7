use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidatorError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ImportError> for ValidatorError {
    fn from(err: ImportError) -> Self {
        ValidatorError::Compile(CompileError::Import(err))
    }
}

/// Failures raised while turning rule text into rules and structure.
///
/// Always fatal: validation never starts with a partially compiled rule set.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid selector at line {line}: {selector}")]
    InvalidSelector { line: usize, selector: String },

    #[error("Unknown type '{name}' at line {line} (expected int, string or any)")]
    UnknownType { line: usize, name: String },

    #[error("Invalid cardinality '{token}' at line {line}")]
    InvalidCardinality { line: usize, token: String },

    #[error("Invalid pattern r\"{pattern}\" at line {line}: {source}")]
    InvalidPattern {
        line: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Import error: {0}")]
    Import(#[from] ImportError),
}

impl CompileError {
    /// Line the error was reported at, when the error is tied to one.
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Parse { line, .. }
            | CompileError::InvalidSelector { line, .. }
            | CompileError::UnknownType { line, .. }
            | CompileError::InvalidCardinality { line, .. }
            | CompileError::InvalidPattern { line, .. } => Some(*line),
            CompileError::Import(_) => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported import scheme in '{location}' (expected file:// or pkg://)")]
    UnsupportedScheme { location: String },

    #[error("Malformed import location '{location}': {source}")]
    InvalidLocation {
        location: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Import location '{location}' does not name a file or package resource")]
    MissingReference { location: String },

    #[error("Unknown package namespace '{namespace}' in '{location}'")]
    UnknownPackage { namespace: String, location: String },

    #[error("Cannot read '{location}': {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Import depth limit of {limit} exceeded at '{location}'")]
    DepthExceeded { location: String, limit: usize },

    #[error("Failed to compile imported rules from '{location}': {source}")]
    Nested {
        location: String,
        #[source]
        source: Box<CompileError>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Empty message")]
    Empty,

    #[error("Message must start with an MSH segment, found '{found}'")]
    MissingHeader { found: String },

    #[error("MSH segment is too short to carry encoding characters")]
    TruncatedHeader,

    #[error("Invalid segment code '{code}' at segment {index}")]
    InvalidSegment { index: usize, code: String },

    #[error("Message is not valid UTF-8: {message}")]
    Encoding { message: String },
}

/// A value did not satisfy a constraint.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("value '{value}' does not satisfy {constraint}")]
pub struct ConstraintViolation {
    pub constraint: String,
    pub value: String,
}

impl ConstraintViolation {
    pub fn new(constraint: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            constraint: constraint.into(),
            value: value.into(),
        }
    }
}

/// A selector path does not fit the shape of the message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot resolve {selector}: {reason}")]
pub struct LookupFailure {
    pub selector: String,
    pub reason: String,
}

impl LookupFailure {
    pub fn new(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}

/// Everything a single field rule can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    #[error(transparent)]
    Violation(#[from] ConstraintViolation),

    #[error(transparent)]
    Lookup(#[from] LookupFailure),
}

pub type Result<T> = std::result::Result<T, ValidatorError>;
