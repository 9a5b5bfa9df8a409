use anyhow::{anyhow, Context, Result};
use clip_rename_core::clipboard::{system_clipboard, ClipboardSource, StaticClipboard};
use clip_rename_core::db::{save_project_config, ProjectLayout, RenameRecord};
use clip_rename_core::naming::{sanitize_with, SuffixMap};
use clip_rename_core::plugin::{MethodAnswer, RenamePlugin};
use clip_rename_core::services::rename::{RenameError, RenameMethod};
use tracing::warn;

use crate::commands::{load_project_config, open_project};
use crate::{canonicalize_or_current, parse_address};

/// Map a `--method` value onto the method dialog's answer.
pub fn method_answer(method: &str) -> Result<MethodAnswer> {
    match method.trim().to_ascii_lowercase().as_str() {
        "address" | "yes" => Ok(MethodAnswer::Yes),
        "operand" | "no" => Ok(MethodAnswer::No),
        "cancel" => Ok(MethodAnswer::Cancel),
        other => Err(anyhow!("Unknown rename method '{}'. Use address or operand", other)),
    }
}

/// The method-selection dialog; persists the binding into `project.json`.
pub fn configure_command(
    root: &str,
    method: Option<&str>,
    operand_index: Option<&str>,
    hotkey: Option<&str>,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);
    let mut config = load_project_config(&layout)?;

    if let Some(key) = hotkey {
        config.hotkey = key.to_string();
    }

    let mut plugin = RenamePlugin::from_settings(&config.rename).with_hotkey(config.hotkey.clone());
    if let Some(method) = method {
        let answer = method_answer(method)?;
        if plugin.select_method(answer, operand_index).is_none() {
            println!("Operation cancelled; keeping the current binding.");
        }
    } else if operand_index.is_some() {
        return Err(anyhow!("--operand-index requires --method operand"));
    }
    config.rename = plugin.settings();

    save_project_config(&layout, &config)?;

    println!("Rename configuration:");
    println!("  Hotkey: {}", config.hotkey);
    match config.rename.method {
        Some(method) => println!("  Method: {}", method.describe()),
        None => println!("  Method: (not selected)"),
    }

    Ok(())
}

/// The hotkey action: rename the target at `at` from the clipboard (or `name`).
pub fn rename_command(
    root: &str,
    binary: Option<&str>,
    at: &str,
    method: Option<&str>,
    operand_index: Option<&str>,
    name: Option<String>,
    json: bool,
) -> Result<()> {
    let ctx = open_project(root)?;
    let record = ctx.binary(binary)?;
    let cursor = parse_address(at)?;

    let config = &ctx.config;
    let mut plugin = RenamePlugin::from_settings(&config.rename).with_hotkey(config.hotkey.clone());
    match (method, operand_index) {
        (Some(method), _) => {
            let answer = method_answer(method)?;
            plugin.select_method(answer, operand_index);
        }
        (None, Some(index)) => {
            if matches!(plugin.method(), Some(RenameMethod::OperandBased { .. })) {
                plugin.select_method(MethodAnswer::No, Some(index));
            }
        }
        (None, None) => {}
    }
    let bound = plugin.method().ok_or(RenameError::NoMethodSelected)?;
    if operand_index.is_some() && !matches!(bound, RenameMethod::OperandBased { .. }) {
        return Err(anyhow!("--operand-index requires --method operand"));
    }
    plugin.init();

    let mut host = ctx.host(&record).with_cursor(cursor);
    if let RenameMethod::OperandBased { .. } = bound {
        let path = ctx.binary_path(&record);
        host = host.with_binary_file(&path, record.arch.as_deref()).with_context(|| {
            format!("Failed to load binary for operand decoding: {}", path.display())
        })?;
    }

    let clipboard: Box<dyn ClipboardSource> = match name {
        Some(text) => Box::new(StaticClipboard::new(text)),
        None => system_clipboard(),
    };

    let outcome = plugin.on_hotkey(&mut host, &clipboard)?;
    // The name is already applied; a missing history row must not fail the rename.
    if let Err(err) =
        ctx.db.insert_rename(&RenameRecord::from_outcome(&record.name, bound, &outcome))
    {
        warn!(
            error = %err,
            address = format_args!("0x{:X}", outcome.address),
            "rename history not recorded"
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    println!("Renamed 0x{:X} to {}", outcome.address, outcome.new_name);
    if let Some(previous) = &outcome.previous_name {
        println!("  Previous name: {}", previous);
    }
    if outcome.collided {
        println!("  Name '{}' already existed; suffix added", outcome.sanitized);
    }

    Ok(())
}

/// Preview sanitization with the project's suffix map, or the default one outside a project.
pub fn sanitize_command(root: &str, text: &str) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);
    let suffixes = if layout.project_config_path.is_file() {
        load_project_config(&layout)?.rename.suffixes
    } else {
        SuffixMap::default()
    };
    println!("{}", sanitize_with(text, &suffixes));
    Ok(())
}

/// Show recorded renames, optionally for one binary.
pub fn history_command(root: &str, binary: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    if let Some(name) = binary {
        ctx.binary(Some(name))?;
    }
    let renames = ctx.db.list_renames(binary).context("Failed to list renames")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&renames)?);
        return Ok(());
    }

    println!("Rename history:");
    if renames.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for entry in renames {
        println!(
            "- [{}] {} 0x{:X}: {} -> {} ({}, clipboard: {:?})",
            entry.renamed_at,
            entry.binary,
            entry.address,
            entry.old_name.as_deref().unwrap_or("(unnamed)"),
            entry.new_name,
            entry.method,
            entry.clipboard
        );
    }

    Ok(())
}
