use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::SymbolRecord;

/// Request to pull the initial symbol table out of a binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRequest {
    pub binary_name: String,
    pub binary_path: PathBuf,
    /// Optional architecture hint (e.g., x86_64, arm64, armv7).
    pub arch: Option<String>,
    /// Optional explicit tool path (e.g., configured rizin path).
    pub tool_path: Option<PathBuf>,
}

/// Symbols returned by a source, plus whatever it reports about itself.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportedSymbols {
    pub symbols: Vec<SymbolRecord>,
    pub source_version: Option<String>,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("Symbol source not found: {0}")]
    MissingSource(String),
    #[error("Symbol source error: {0}")]
    Source(String),
}

/// Something that can enumerate the named addresses of a binary.
pub trait SymbolSource: Send + Sync {
    fn load(&self, request: &SymbolRequest) -> Result<ImportedSymbols, SourceError>;
    fn name(&self) -> &'static str;
}

/// Registry for symbol sources; callers select by name.
#[derive(Default)]
pub struct SourceRegistry {
    sources: HashMap<String, Box<dyn SymbolSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self { sources: HashMap::new() }
    }

    pub fn register<S: SymbolSource + 'static>(&mut self, source: S) -> &mut Self {
        self.sources.insert(source.name().to_string(), Box::new(source));
        self
    }

    pub fn get(&self, name: &str) -> Option<&dyn SymbolSource> {
        self.sources.get(name).map(|s| &**s)
    }

    /// Look up a source or fail with the list of known names.
    pub fn require(&self, name: &str) -> Result<&dyn SymbolSource, SourceError> {
        self.get(name).ok_or_else(|| {
            SourceError::MissingSource(format!("'{}' (available: {})", name, self.names().join(", ")))
        })
    }

    /// Return a sorted list of registered source names for error messages/help.
    pub fn names(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sources.keys().cloned().collect();
        keys.sort();
        keys
    }
}

/// Registry populated with every source compiled into this build.
pub fn default_source_registry() -> SourceRegistry {
    #[allow(unused_mut)]
    let mut registry = SourceRegistry::new();
    #[cfg(feature = "capstone-backend")]
    {
        registry.register(crate::services::backends::ObjectSource);
    }
    #[cfg(feature = "rizin-backend")]
    {
        registry.register(crate::services::backends::RizinSource);
    }
    registry
}
