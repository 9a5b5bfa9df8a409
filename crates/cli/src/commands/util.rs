use std::path::Path;

use anyhow::Result;
use clip_rename_core::db::{ProjectConfig, ProjectContext, ProjectLayout};

use crate::canonicalize_or_current;

/// Load the project config JSON from disk (delegates to core helper).
pub fn load_project_config(layout: &ProjectLayout) -> Result<ProjectConfig> {
    clip_rename_core::db::load_project_config(layout)
}

/// Resolve `root` and open the project there: config plus migrated database.
pub fn open_project(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(root_path)
}

/// Helper to print whether a directory exists.
pub fn print_dir_status(label: &str, path: &Path) {
    let exists = path.is_dir();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}
