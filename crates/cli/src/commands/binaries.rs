use std::path::Path;

use crate::commands::open_project;
use crate::sha256_file;
use anyhow::{anyhow, Context, Result};
use clip_rename_core::db::BinaryRecord;
use clip_rename_core::services::backends::detect_arch;

/// Register a binary in the project database.
///
/// When `arch` is omitted it is read from the object header if possible.
pub fn add_binary_command(
    root: &str,
    path: &str,
    name: Option<String>,
    arch: Option<String>,
    hash: Option<String>,
    skip_hash: bool,
) -> Result<()> {
    let ctx = open_project(root)?;
    let root_path = ctx.layout.root.clone();
    let db = &ctx.db;

    // Normalize the binary path.
    let input_path = Path::new(path);
    let abs_path = if input_path.is_absolute() {
        input_path.to_path_buf()
    } else {
        root_path.join(input_path)
    };

    if !abs_path.exists() {
        return Err(anyhow!("Binary file does not exist: {}", abs_path.display()));
    }

    // Store path relative to project root when possible.
    let rel_path = abs_path
        .canonicalize()
        .ok()
        .and_then(|abs_canon| {
            root_path.canonicalize().ok().and_then(|root_canon| {
                abs_canon.strip_prefix(&root_canon).ok().map(|p| p.to_path_buf())
            })
        })
        .or_else(|| abs_path.strip_prefix(&root_path).ok().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| abs_path.clone());

    let binary_name = name.unwrap_or_else(|| {
        input_path.file_name().and_then(|os| os.to_str()).unwrap_or(path).to_string()
    });

    if db.find_binary(&binary_name).context("Failed to look up binary")?.is_some() {
        return Err(anyhow!("Binary '{}' is already registered", binary_name));
    }

    let arch = match arch {
        Some(a) => Some(a),
        None => {
            let bytes = std::fs::read(&abs_path)
                .with_context(|| format!("Failed to read binary: {}", abs_path.display()))?;
            detect_arch(&bytes)
        }
    };

    let hash = match (hash, skip_hash) {
        (Some(h), _) => Some(h),
        (None, true) => None,
        (None, false) => Some(sha256_file(&abs_path)?),
    };

    let record = BinaryRecord {
        name: binary_name,
        path: rel_path.to_string_lossy().to_string(),
        arch,
        hash,
    };
    let id = db.insert_binary(&record).context("Failed to insert binary record")?;

    println!("Added binary:");
    println!("  Id: {}", id);
    println!("  Name: {}", record.name);
    println!("  Path (relative): {}", record.path);
    println!("  Arch: {}", record.arch.as_deref().unwrap_or("(unknown)"));
    println!("  DB: {}", ctx.db_path.display());

    Ok(())
}

/// List all binaries registered in the project database.
pub fn list_binaries_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let binaries = ctx.db.list_binaries().context("Failed to list binaries")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&binaries)?);
        return Ok(());
    }

    println!("Binaries:");
    if binaries.is_empty() {
        println!("(none)");
        return Ok(());
    }

    for bin in binaries {
        let arch_display = bin.arch.as_deref().unwrap_or("(unspecified)");
        let hash_display = bin.hash.as_deref().unwrap_or("(none)");
        println!(
            "- {} (path: {}, arch: {}, hash: {})",
            bin.name, bin.path, arch_display, hash_display
        );
    }

    Ok(())
}
