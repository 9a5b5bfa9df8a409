use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::debug;

use crate::db::{SymbolKind, SymbolRecord};
use crate::services::sources::{ImportedSymbols, SourceError, SymbolRequest, SymbolSource};

/// Rizin-backed source that shells out to rizin with `aa;aflj` to list analyzed functions.
pub struct RizinSource;

impl SymbolSource for RizinSource {
    fn load(&self, request: &SymbolRequest) -> Result<ImportedSymbols, SourceError> {
        if !request.binary_path.is_file() {
            return Err(SourceError::MissingBinary(request.binary_path.clone()));
        }

        let rizin_path = request.tool_path.clone().unwrap_or_else(resolve_rizin_path);
        let version = version_string(&rizin_path).map_err(SourceError::Source)?;

        // Allow tests to feed synthetic JSON via env to avoid needing rizin installed.
        let body = if let Some(fake_json) = std::env::var_os("CLIP_RENAME_RIZIN_FAKE_JSON") {
            fs::read_to_string(fake_json).map_err(|e| {
                SourceError::Source(format!("failed to read CLIP_RENAME_RIZIN_FAKE_JSON: {e}"))
            })?
        } else {
            run_rizin_json(&rizin_path, &request.binary_path, "aa;aflj")?
        };
        let symbols = parse_functions(&body)?;
        debug!(binary = %request.binary_name, count = symbols.len(), "rizin functions loaded");

        Ok(ImportedSymbols { symbols, source_version: Some(version) })
    }

    fn name(&self) -> &'static str {
        "rizin"
    }
}

fn resolve_rizin_path() -> PathBuf {
    std::env::var_os("RIZIN_BIN").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("rizin"))
}

fn run_rizin_json(rizin_bin: &Path, binary: &Path, command: &str) -> Result<String, SourceError> {
    let output = Command::new(rizin_bin)
        .args(["-2", "-q0", "-c", command])
        .arg(binary)
        .output()
        .map_err(|e| SourceError::Source(format!("failed to spawn rizin: {e}")))?;
    if !output.status.success() {
        return Err(SourceError::Source(format!("rizin exited with {}", output.status)));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn parse_functions(body: &str) -> Result<Vec<SymbolRecord>, SourceError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let funcs: Vec<RizinFunction> = serde_json::from_str(body)
        .map_err(|e| SourceError::Source(format!("failed to parse rizin JSON: {e}")))?;
    Ok(funcs
        .into_iter()
        .filter_map(|f| match (f.offset, f.name) {
            (Some(offset), Some(name)) if !name.is_empty() => {
                Some(SymbolRecord::new(offset, name, SymbolKind::Function))
            }
            _ => None,
        })
        .collect())
}

fn version_string(rizin_bin: &Path) -> Result<String, String> {
    if let Some(fake) = std::env::var_os("CLIP_RENAME_RIZIN_FAKE_VERSION") {
        return Ok(fake.to_string_lossy().to_string());
    }
    let output = Command::new(rizin_bin)
        .arg("-v")
        .output()
        .map_err(|e| format!("failed to spawn rizin: {e}"))?;
    if !output.status.success() {
        return Err(format!("rizin -v exited with {}", output.status));
    }
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if stdout.is_empty() {
        Err("rizin -v produced no output".to_string())
    } else {
        Ok(stdout)
    }
}

#[derive(Debug, Deserialize)]
struct RizinFunction {
    #[serde(default)]
    offset: Option<u64>,
    #[serde(default)]
    name: Option<String>,
}
