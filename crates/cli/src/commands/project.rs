use std::fs;

use crate::commands::{open_project, print_dir_status};
use crate::{canonicalize_or_current, infer_project_name};
use anyhow::{Context, Result};
use clip_rename_core::db::{
    BinaryRecord, ProjectConfig, ProjectContext, ProjectDb, ProjectLayout,
};
use clip_rename_core::naming::SuffixRule;
use clip_rename_core::services::rename::RenameMethod;
use clip_rename_core::services::sources::default_source_registry;
use serde::Serialize;

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub db_path: String,
    pub hotkey: String,
    pub rename_method: Option<RenameMethod>,
    pub suffix_rules: Vec<SuffixRule>,
    pub default_source: Option<String>,
    pub available_sources: Vec<String>,
    pub binaries: Vec<BinaryInfo>,
    pub renames: usize,
}

#[derive(Serialize)]
pub struct BinaryInfo {
    #[serde(flatten)]
    pub record: BinaryRecord,
    pub symbols: usize,
}

/// Initialize a new project at `root`.
pub fn init_project_command(root: &str, name: Option<String>) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;

    let config = ProjectConfig::new(&project_name, layout.db_path_relative_string());
    clip_rename_core::db::save_project_config(&layout, &config)?;

    // Create the project database immediately so follow-on commands (and tests)
    // can rely on its presence.
    ProjectDb::open(&layout.db_path).with_context(|| {
        format!("Failed to initialize project database at {}", layout.db_path.display())
    })?;

    println!("Initialized clip-rename project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  DB path (relative): {}", config.db.path);
    println!("  Hotkey: {}", config.hotkey);
    println!("  Next: add-binary, then configure --method address|operand");

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ProjectContext { layout, config, db_path, db } = open_project(root)?;
    let mut binaries = Vec::new();
    for record in db.list_binaries().context("Failed to list binaries")? {
        let symbols = db.list_symbols(&record.name).context("Failed to list symbols")?.len();
        binaries.push(BinaryInfo { record, symbols });
    }
    let renames = db.list_renames(None).context("Failed to list renames")?.len();

    let snapshot = ProjectInfoSnapshot {
        name: config.name.clone(),
        root: layout.root.display().to_string(),
        config_file: layout.project_config_path.display().to_string(),
        config_version: config.config_version.clone(),
        db_path: db_path.display().to_string(),
        hotkey: config.hotkey.clone(),
        rename_method: config.rename.method,
        suffix_rules: config.rename.suffixes.rules().to_vec(),
        default_source: config.default_source.clone(),
        available_sources: default_source_registry().names(),
        binaries,
        renames,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("clip-rename Project Info");
    println!("========================");
    println!("Name: {}", snapshot.name);
    println!("Root: {}", snapshot.root);
    println!("Config file: {}", snapshot.config_file);
    println!("Config version: {}", snapshot.config_version);
    println!("DB path: {}", snapshot.db_path);
    println!("Hotkey: {}", snapshot.hotkey);
    match snapshot.rename_method {
        Some(method) => println!("Rename method: {}", method.describe()),
        None => println!("Rename method: (not selected; run configure)"),
    }
    println!("Suffix rules:");
    for rule in &snapshot.suffix_rules {
        println!("  {} -> {}", rule.suffix, rule.token);
    }
    println!(
        "Symbol sources: {}",
        if snapshot.available_sources.is_empty() {
            "(none compiled in)".to_string()
        } else {
            snapshot.available_sources.join(", ")
        }
    );
    println!();

    println!("Binaries ({}):", snapshot.binaries.len());
    for bin in &snapshot.binaries {
        println!("  - {} ({} symbols)", bin.record.name, bin.symbols);
    }
    println!("Renames recorded: {}", snapshot.renames);
    println!();

    println!("Directories:");
    print_dir_status("Meta dir (.cliprename)", &layout.meta_dir);

    Ok(())
}
