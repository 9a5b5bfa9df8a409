use anyhow::Result;
use serde::Serialize;

use clip_rename_core::services::sources::default_source_registry;

#[derive(Debug, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub description: String,
}

/// List symbol sources compiled into this binary.
pub fn list_sources_command(json: bool) -> Result<()> {
    let registry = default_source_registry();
    let entries: Vec<SourceInfo> = registry
        .names()
        .into_iter()
        .map(|name| {
            let description = match name.as_str() {
                "object" => "Symbol tables of ELF/PE/Mach-O files (goblin)".to_string(),
                "rizin" => {
                    "rizin function analysis (aa;aflj); set RIZIN_BIN or tools.rizin".to_string()
                }
                other => format!("Source '{}'", other),
            };
            SourceInfo { name, description }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Symbol sources: (none)");
        return Ok(());
    }

    println!("Symbol sources:");
    for entry in entries {
        println!("- {}: {}", entry.name, entry.description);
    }
    println!("Name maps (--from-file) are always available.");

    Ok(())
}
