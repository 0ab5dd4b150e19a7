use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::compiler::DEFAULT_MAX_IMPORT_DEPTH;
use crate::error::{Result, ValidatorError};

/// Settings shared by the compiler, import loader and message decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Directory relative `file://` imports are resolved against.
    pub import_base_dir: Option<PathBuf>,
    /// `pkg://<namespace>/...` roots.
    pub packages: HashMap<String, PathBuf>,
    /// How many imports may be nested inside each other.
    pub max_import_depth: usize,
    pub decode: DecodeOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Replace invalid UTF-8 instead of rejecting the message.
    pub lenient_utf8: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            import_base_dir: None,
            packages: HashMap::new(),
            max_import_depth: DEFAULT_MAX_IMPORT_DEPTH,
            decode: DecodeOptions::default(),
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { lenient_utf8: true }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_import_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.import_base_dir = Some(dir.into());
        self
    }

    pub fn with_package(mut self, namespace: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.packages.insert(namespace.into(), root.into());
        self
    }

    pub fn with_max_import_depth(mut self, depth: usize) -> Self {
        self.max_import_depth = depth;
        self
    }

    pub fn with_lenient_utf8(mut self, lenient: bool) -> Self {
        self.decode.lenient_utf8 = lenient;
        self
    }

    /// Loads a configuration from a JSON file; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_import_depth == 0 {
            return Err(ValidatorError::Config {
                message: "max_import_depth must be at least 1".to_string(),
            });
        }

        for (namespace, root) in &self.packages {
            if namespace.is_empty() {
                return Err(ValidatorError::Config {
                    message: format!("Package root {} has an empty namespace", root.display()),
                });
            }
        }

        Ok(())
    }
}
