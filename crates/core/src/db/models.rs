use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::services::rename::{RenameMethod, RenameOutcome};

/// Record describing a binary known to the project.
///
/// Each binary owns its own symbol namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BinaryRecord {
    /// Human-friendly name (e.g., "httpd (armv7)").
    pub name: String,
    /// Path to the binary, relative to the project root if possible.
    pub path: String,
    /// Optional architecture string (e.g., "armv7", "x86_64").
    pub arch: Option<String>,
    /// Optional content hash for identity (e.g., SHA-256).
    pub hash: Option<String>,
}

impl BinaryRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self { name: name.into(), path: path.into(), arch: None, hash: None }
    }
}

/// Where a symbol came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Data,
    /// Named by the user (rename or name map).
    User,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Data => "data",
            SymbolKind::User => "user",
        }
    }

    pub fn from_db_str(value: &str) -> Self {
        match value {
            "function" => SymbolKind::Function,
            "data" => SymbolKind::Data,
            _ => SymbolKind::User,
        }
    }
}

/// A named address in a binary's namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SymbolRecord {
    pub address: u64,
    pub name: String,
    pub kind: SymbolKind,
}

impl SymbolRecord {
    pub fn new(address: u64, name: impl Into<String>, kind: SymbolKind) -> Self {
        Self { address, name: name.into(), kind }
    }
}

/// One applied rename, kept for auditing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameRecord {
    pub binary: String,
    pub address: u64,
    pub old_name: Option<String>,
    pub new_name: String,
    /// Raw clipboard text the name was derived from.
    pub clipboard: String,
    /// `address` or `operand`.
    pub method: String,
    /// RFC 3339 timestamp.
    pub renamed_at: String,
}

impl RenameRecord {
    /// Build a history entry for `outcome`, stamped with the current time.
    pub fn from_outcome(binary: &str, method: RenameMethod, outcome: &RenameOutcome) -> Self {
        Self {
            binary: binary.to_string(),
            address: outcome.address,
            old_name: outcome.previous_name.clone(),
            new_name: outcome.new_name.clone(),
            clipboard: outcome.clipboard_text.clone(),
            method: method.as_str().to_string(),
            renamed_at: Utc::now().to_rfc3339(),
        }
    }
}
