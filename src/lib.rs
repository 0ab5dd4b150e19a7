//! # OctoFHIR HL7 Validator
//!
//! Rule-driven validation of HL7 v2 messages. A profile is written in a small rule
//! language that describes which segments a message must contain, how they nest, and
//! what individual fields must look like. Validation produces an ordered log of
//! outcomes plus one validity flag.
//!
//! ## Features
//!
//! - **Field rules**: `must be`, `may be` and `cannot be` checks on dotted field paths
//! - **Structure rules**: indentation-nested segment trees with cardinalities
//! - **Imports**: splice shared rule sets from `file://` or `pkg://` locations
//! - **Reports**: every rule is logged, serializable to JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use octofhir_hl7validator::*;
//!
//! # fn example() -> Result<()> {
//! let rules = r#"
//! MSH
//! PID
//!   [PD1]
//! "MSH.3.1" must be "SrcSystem"
//! "PID.8" may be one of "F", "M", "U"
//! "#;
//!
//! let context = Validator::new(rules)
//!     .validate_str("MSH|^~\\&|SrcSystem||Target\rPID|1||123||Doe^John|||F\r")?;
//! assert!(context.is_valid());
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod compiler;
pub mod config;
pub mod error;
pub mod message;
pub mod parser;
pub mod types;
pub mod validation;
pub mod validator;

pub use compiler::{CompiledRules, FileSystemLoader, ImportLocation, MemoryLoader, ResourceLoader, RuleCompiler};
pub use config::{DecodeOptions, ValidatorConfig};
pub use error::Result; // Our Result type takes precedence
pub use error::{
    CompileError, ConstraintViolation, DecodeError, ImportError, LookupFailure, RuleError,
    ValidatorError,
};
pub use message::{Message, Segment, Separators};
pub use parser::{RuleLanguageParser, RuleParser, RuleTree};
pub use types::*;
pub use validation::{Context, Outcome, OutcomeLog, ValidationReport, validate_compiled};
pub use validator::Validator;
