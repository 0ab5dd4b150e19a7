//! Import resolution for `import "<scheme>://<ref>"` directives.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::ValidatorConfig;
use crate::error::ImportError;

pub const FILE_SCHEME: &str = "file";
pub const PACKAGE_SCHEME: &str = "pkg";

/// Parsed target of an import directive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImportLocation {
    /// `file://<path>`; a path without a leading `/` is relative.
    File(PathBuf),
    /// `pkg://<namespace>/<resource>`
    Package { namespace: String, resource: String },
}

impl ImportLocation {
    /// Parses `file://<path>` or `pkg://<namespace>/<resource>`.
    ///
    /// Only the scheme goes through URL parsing. The reference after `://` is kept
    /// verbatim, with no percent-encoding or host normalisation.
    pub fn parse(location: &str) -> std::result::Result<Self, ImportError> {
        let invalid = |source| ImportError::InvalidLocation {
            location: location.to_string(),
            source,
        };
        let Some((scheme, reference)) = location.split_once("://") else {
            Url::parse(location).map_err(invalid)?;
            return Err(ImportError::MissingReference {
                location: location.to_string(),
            });
        };

        let scheme_url = Url::parse(&format!("{scheme}:x")).map_err(invalid)?;
        let scheme = scheme_url.scheme();
        if scheme != FILE_SCHEME && scheme != PACKAGE_SCHEME {
            return Err(ImportError::UnsupportedScheme {
                location: location.to_string(),
            });
        }
        if reference.is_empty() {
            return Err(ImportError::MissingReference {
                location: location.to_string(),
            });
        }

        if scheme == FILE_SCHEME {
            return Ok(ImportLocation::File(PathBuf::from(reference)));
        }

        match reference.split_once('/') {
            Some((namespace, resource)) if !namespace.is_empty() && !resource.is_empty() => {
                Ok(ImportLocation::Package {
                    namespace: namespace.to_string(),
                    resource: resource.to_string(),
                })
            }
            _ => Err(ImportError::MissingReference {
                location: location.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImportLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportLocation::File(path) => write!(f, "{FILE_SCHEME}://{}", path.display()),
            ImportLocation::Package {
                namespace,
                resource,
            } => write!(f, "{PACKAGE_SCHEME}://{namespace}/{resource}"),
        }
    }
}

/// Fetches the text of imported rule sets.
pub trait ResourceLoader: Send + Sync {
    fn load(&self, location: &ImportLocation) -> std::result::Result<String, ImportError>;
}

/// Reads `file://` imports from disk and `pkg://` imports from registered package roots.
#[derive(Debug, Clone, Default)]
pub struct FileSystemLoader {
    base_dir: Option<PathBuf>,
    packages: HashMap<String, PathBuf>,
}

impl FileSystemLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self {
            base_dir: config.import_base_dir.clone(),
            packages: config.packages.clone(),
        }
    }

    /// Directory relative `file://` paths are resolved against.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    pub fn with_package(mut self, namespace: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.packages.insert(namespace.into(), root.into());
        self
    }

    fn resolve(&self, location: &ImportLocation) -> std::result::Result<PathBuf, ImportError> {
        match location {
            ImportLocation::File(path) => Ok(match &self.base_dir {
                Some(base) if path.is_relative() => base.join(path),
                _ => path.clone(),
            }),
            ImportLocation::Package {
                namespace,
                resource,
            } => {
                let root = self
                    .packages
                    .get(namespace)
                    .ok_or_else(|| ImportError::UnknownPackage {
                        namespace: namespace.clone(),
                        location: location.to_string(),
                    })?;
                Ok(root.join(Path::new(resource)))
            }
        }
    }
}

impl ResourceLoader for FileSystemLoader {
    fn load(&self, location: &ImportLocation) -> std::result::Result<String, ImportError> {
        let path = self.resolve(location)?;
        tracing::debug!("Reading {} from {}", location, path.display());
        std::fs::read_to_string(&path).map_err(|source| ImportError::Read {
            location: location.to_string(),
            source,
        })
    }
}

/// Serves imports from an in-memory map keyed by location (`pkg://ns/res`, `file://path`).
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    resources: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, location: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(location, text);
        self
    }

    pub fn insert(&mut self, location: impl Into<String>, text: impl Into<String>) {
        self.resources.insert(location.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceLoader for MemoryLoader {
    fn load(&self, location: &ImportLocation) -> std::result::Result<String, ImportError> {
        let key = location.to_string();
        self.resources
            .get(&key)
            .cloned()
            .ok_or_else(|| ImportError::Read {
                location: key,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "resource not registered"),
            })
    }
}
