use serde::{Deserialize, Serialize};

use crate::plugin::{RenameSettings, DEFAULT_HOTKEY};

/// Database configuration stored in `project.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbConfig {
    /// Path to the project database file (typically relative to project root).
    pub path: String,
}

impl DbConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Paths to external tools used by symbol sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rizin: Option<String>,
}

/// Serializable configuration describing a clip-rename project.
///
/// This lives at `.cliprename/project.json` in the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Schema/config version. This is about the config format, not binary version.
    pub config_version: String,
    /// Database configuration (path is typically relative to project root).
    pub db: DbConfig,
    /// Key the rename action is bound to.
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
    /// Bound rename method and suffix rules.
    #[serde(default)]
    pub rename: RenameSettings,
    #[serde(default)]
    pub tools: ToolPaths,
    /// Symbol source used by `import-symbols` when none is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_source: Option<String>,
}

fn default_hotkey() -> String {
    DEFAULT_HOTKEY.to_string()
}

impl ProjectConfig {
    /// Create a new project configuration using the given name and db path.
    pub fn new(name: impl Into<String>, db_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            db: DbConfig::new(db_path),
            hotkey: default_hotkey(),
            rename: RenameSettings::default(),
            tools: ToolPaths::default(),
            default_source: None,
        }
    }
}
