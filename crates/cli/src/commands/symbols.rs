use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clip_rename_core::db::{SymbolKind, SymbolRecord};
use clip_rename_core::naming::is_valid_symbol_name;
use clip_rename_core::services::sources::{default_source_registry, SymbolRequest};
use serde::Deserialize;
use tracing::warn;

use crate::commands::open_project;
use crate::parse_address;

/// One entry of a name map file.
#[derive(Debug, Deserialize)]
pub struct NameMapEntry {
    pub address: MapAddress,
    pub name: String,
}

/// Addresses in name maps may be numbers or strings such as `"0x401000"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum MapAddress {
    Number(u64),
    Text(String),
}

impl MapAddress {
    fn resolve(&self) -> Result<u64> {
        match self {
            MapAddress::Number(n) => Ok(*n),
            MapAddress::Text(text) => parse_address(text),
        }
    }
}

/// Parse a YAML or JSON name map (`[{address, name}]`) into user symbols.
///
/// Entries with unusable names are skipped with a warning.
pub fn load_name_map(path: &Path) -> Result<Vec<SymbolRecord>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read name map: {}", path.display()))?;
    let is_json =
        path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let entries: Vec<NameMapEntry> = if is_json {
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse name map JSON: {}", path.display()))?
    } else {
        serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse name map YAML: {}", path.display()))?
    };

    let mut symbols = Vec::with_capacity(entries.len());
    for entry in entries {
        let address = entry.address.resolve()?;
        if !is_valid_symbol_name(&entry.name) {
            warn!(
                address = format_args!("0x{address:X}"),
                name = %entry.name,
                "skipping invalid name"
            );
            continue;
        }
        symbols.push(SymbolRecord::new(address, entry.name, SymbolKind::User));
    }
    Ok(symbols)
}

/// Seed a binary's namespace from a symbol source or a name map file.
pub fn import_symbols_command(
    root: &str,
    binary: Option<&str>,
    source: Option<&str>,
    from_file: Option<&str>,
) -> Result<()> {
    let ctx = open_project(root)?;
    let config = &ctx.config;
    let record = ctx.binary(binary)?;

    let (origin, symbols) = match from_file {
        Some(file) => {
            let path = Path::new(file);
            let path =
                if path.is_absolute() { path.to_path_buf() } else { ctx.layout.root.join(path) };
            (format!("name map {}", path.display()), load_name_map(&path)?)
        }
        None => {
            let registry = default_source_registry();
            let name = source
                .map(str::to_string)
                .or_else(|| config.default_source.clone())
                .or_else(|| registry.names().into_iter().next())
                .ok_or_else(|| anyhow!("No symbol sources compiled in; use --from-file"))?;
            let src = registry.require(&name)?;
            let request = SymbolRequest {
                binary_name: record.name.clone(),
                binary_path: ctx.binary_path(&record),
                arch: record.arch.clone(),
                tool_path: match name.as_str() {
                    "rizin" => config.tools.rizin.as_ref().map(PathBuf::from),
                    _ => None,
                },
            };
            let imported = src
                .load(&request)
                .with_context(|| format!("Symbol source '{}' failed", name))?;
            let origin = match imported.source_version {
                Some(version) => format!("{} ({})", name, version),
                None => name,
            };
            (origin, imported.symbols)
        }
    };

    let stats = ctx.db.import_symbols(&record.name, &symbols).context("Failed to import symbols")?;

    println!("Imported symbols:");
    println!("  Binary: {}", record.name);
    println!("  From: {}", origin);
    println!("  Inserted: {}", stats.inserted);
    println!("  Skipped (conflicts): {}", stats.skipped);

    Ok(())
}

/// List the named addresses of a binary.
pub fn list_symbols_command(root: &str, binary: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_project(root)?;
    let record = ctx.binary(binary)?;
    let symbols = ctx.db.list_symbols(&record.name).context("Failed to list symbols")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&symbols)?);
        return Ok(());
    }

    println!("Symbols for {}:", record.name);
    if symbols.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for sym in symbols {
        println!("  0x{:08X}  {:<8}  {}", sym.address, sym.kind.as_str(), sym.name);
    }

    Ok(())
}
