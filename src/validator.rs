use std::fmt;

use crate::compiler::{CompiledRules, FileSystemLoader, ResourceLoader, RuleCompiler};
use crate::config::ValidatorConfig;
use crate::error::Result;
use crate::message::Message;
use crate::parser::{RuleLanguageParser, RuleParser};
use crate::validation::{Context, validate_compiled};

/// Validates messages against one rule set.
///
/// Rules are compiled on every validation call, so a malformed rule set is reported
/// before any message is looked at. Use [`Validator::compile`] together with
/// [`validate_compiled`] to reuse one compilation for many messages.
pub struct Validator {
    rules: String,
    parser: Box<dyn RuleParser>,
    loader: Option<Box<dyn ResourceLoader>>,
    config: ValidatorConfig,
}

impl Validator {
    pub fn new(rules: impl Into<String>) -> Self {
        Self {
            rules: rules.into(),
            parser: Box::new(RuleLanguageParser::new()),
            loader: None,
            config: ValidatorConfig::default(),
        }
    }

    /// Replaces the rule language parser; imported rule sets use it as well.
    pub fn with_parser(mut self, parser: impl RuleParser + 'static) -> Self {
        self.parser = Box::new(parser);
        self
    }

    /// Replaces the loader used for imports. Without one, imports are read from disk
    /// using the configured base directory and package roots.
    pub fn with_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn with_config(mut self, config: ValidatorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn rules(&self) -> &str {
        &self.rules
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn compile(&self) -> Result<CompiledRules> {
        self.config.validate()?;

        let default_loader;
        let loader: &dyn ResourceLoader = match &self.loader {
            Some(loader) => loader.as_ref(),
            None => {
                default_loader = FileSystemLoader::from_config(&self.config);
                &default_loader
            }
        };

        let compiled = RuleCompiler::new(self.parser.as_ref(), loader)
            .with_max_import_depth(self.config.max_import_depth)
            .compile(&self.rules)?;

        tracing::info!(
            "Compiled {} field rules, {} structure roots",
            compiled.rules().len(),
            compiled.forest().roots().len()
        );
        Ok(compiled)
    }

    pub fn validate(&self, message: Message) -> Result<Context> {
        let compiled = self.compile()?;
        Ok(validate_compiled(&compiled, message))
    }

    /// Decodes message text and validates it.
    pub fn validate_str(&self, message: &str) -> Result<Context> {
        let compiled = self.compile()?;
        let message = Message::parse(message)?;
        Ok(validate_compiled(&compiled, message))
    }

    /// Decodes raw message bytes and validates them.
    pub fn validate_bytes(&self, message: &[u8]) -> Result<Context> {
        let compiled = self.compile()?;
        let message = Message::from_bytes(message, self.config.decode.lenient_utf8)?;
        Ok(validate_compiled(&compiled, message))
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validator")
            .field("rules", &self.rules.lines().count())
            .field("custom_loader", &self.loader.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
