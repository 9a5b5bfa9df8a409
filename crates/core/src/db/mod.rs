//! Project database integration and project layout definitions.
//!
//! This module wraps a SQLite database storing:
//! - Binaries and their metadata
//! - One symbol namespace per binary
//! - The history of applied renames
//!
//! `ProjectHost` exposes a binary's namespace as a [`crate::host::SymbolHost`],
//! which is what the rename flow writes through.

pub mod config;
pub mod context;
pub mod host;
pub mod layout;
pub mod models;
pub mod project_db;
pub mod util;

pub use config::{DbConfig, ProjectConfig, ToolPaths};
pub use context::ProjectContext;
pub use host::ProjectHost;
pub use layout::ProjectLayout;
pub use models::{BinaryRecord, RenameRecord, SymbolKind, SymbolRecord};
pub use project_db::{DbError, DbResult, ImportStats, ProjectDb, CURRENT_SCHEMA_VERSION};
pub use util::{load_project_config, open_project_db, save_project_config};
