use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::db::{
    open_project_db, BinaryRecord, ProjectConfig, ProjectDb, ProjectHost, ProjectLayout,
};

/// An opened project: where it lives, how it is configured, and its database.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub db_path: PathBuf,
    pub db: ProjectDb,
}

impl ProjectContext {
    /// Load `project.json` under `root` and open (migrating if needed) its database.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let (config, db_path, db) = open_project_db(&layout)?;
        Ok(Self { layout, config, db_path, db })
    }

    /// Look up a registered binary by name, or take the only one registered.
    pub fn binary(&self, name: Option<&str>) -> Result<BinaryRecord> {
        if let Some(name) = name {
            return self
                .db
                .find_binary(name)
                .context("Failed to look up binary")?
                .ok_or_else(|| anyhow!("Binary '{}' is not registered in this project", name));
        }
        let mut binaries = self.db.list_binaries().context("Failed to list binaries")?;
        match binaries.len() {
            0 => Err(anyhow!("No binaries registered. Run add-binary first")),
            1 => Ok(binaries.remove(0)),
            _ => Err(anyhow!(
                "Multiple binaries registered; pass --binary (one of: {})",
                binaries.iter().map(|b| b.name.as_str()).collect::<Vec<_>>().join(", ")
            )),
        }
    }

    /// Absolute path of a registered binary.
    pub fn binary_path(&self, record: &BinaryRecord) -> PathBuf {
        self.layout.resolve_binary_path(&record.path)
    }

    /// Symbol host over `record`'s namespace.
    pub fn host(&self, record: &BinaryRecord) -> ProjectHost<'_> {
        ProjectHost::new(&self.db, record.name.clone())
    }
}
