//! Hotkey-bound rename controller.
//!
//! A host UI drives this the way a disassembler drives a plugin: `init` once,
//! `select_method` when the user runs the plugin (the address-vs-operand
//! prompt), then `on_hotkey` every time the bound key is pressed.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clipboard::ClipboardSource;
use crate::host::SymbolHost;
use crate::naming::SuffixMap;
use crate::services::rename::{
    rename_from_clipboard, RenameError, RenameMethod, RenameOutcome, DEFAULT_OPERAND_INDEX,
};

pub const PLUGIN_NAME: &str = "Fast_Rename_Clipboard";
pub const DEFAULT_HOTKEY: &str = "Shift+V";

/// Persisted rename preferences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenameSettings {
    /// Method bound to the hotkey; `None` until the user picks one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<RenameMethod>,
    /// Suffix rules applied during sanitization.
    #[serde(default)]
    pub suffixes: SuffixMap,
}

/// Answer to "address-based (yes) or operand-based (no)?".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAnswer {
    Yes,
    No,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginStatus {
    /// Keep the plugin loaded.
    Ok,
}

/// Parsed operand-index prompt input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperandIndexInput {
    pub index: usize,
    /// The input was not a usable index and `index` fell back to the previous value.
    pub invalid: bool,
}

/// Interpret the operand-index prompt.
///
/// Blank input selects the default index; unparsable input keeps `previous`.
pub fn parse_operand_index(input: Option<&str>, previous: usize) -> OperandIndexInput {
    let trimmed = input.map(str::trim).unwrap_or("");
    if trimmed.is_empty() {
        return OperandIndexInput { index: DEFAULT_OPERAND_INDEX, invalid: false };
    }
    match trimmed.parse::<usize>() {
        Ok(index) => OperandIndexInput { index, invalid: false },
        Err(_) => OperandIndexInput { index: previous, invalid: true },
    }
}

#[derive(Debug, Clone)]
pub struct RenamePlugin {
    hotkey: String,
    operand_index: usize,
    bound: Option<RenameMethod>,
    suffixes: SuffixMap,
}

impl Default for RenamePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl RenamePlugin {
    pub fn new() -> Self {
        Self {
            hotkey: DEFAULT_HOTKEY.to_string(),
            operand_index: DEFAULT_OPERAND_INDEX,
            bound: None,
            suffixes: SuffixMap::default(),
        }
    }

    /// Restore a plugin from persisted settings (binding included).
    pub fn from_settings(settings: &RenameSettings) -> Self {
        let mut plugin = Self::new().with_suffixes(settings.suffixes.clone());
        if let Some(method) = settings.method {
            plugin.bind(method);
        }
        plugin
    }

    pub fn with_hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = hotkey.into();
        self
    }

    pub fn with_suffixes(mut self, suffixes: SuffixMap) -> Self {
        self.suffixes = suffixes;
        self
    }

    pub fn hotkey(&self) -> &str {
        &self.hotkey
    }

    pub fn method(&self) -> Option<RenameMethod> {
        self.bound
    }

    pub fn operand_index(&self) -> usize {
        self.operand_index
    }

    /// Snapshot of the current binding for persistence.
    pub fn settings(&self) -> RenameSettings {
        RenameSettings { method: self.bound, suffixes: self.suffixes.clone() }
    }

    pub fn init(&mut self) -> PluginStatus {
        info!("{PLUGIN_NAME} initialized. Waiting for {} to trigger renaming.", self.hotkey);
        PluginStatus::Ok
    }

    pub fn term(&mut self) {
        self.bound = None;
        info!("{PLUGIN_NAME} terminated.");
    }

    /// Bind `method` to the hotkey, replacing any previous binding.
    pub fn bind(&mut self, method: RenameMethod) {
        if let RenameMethod::OperandBased { operand_index } = method {
            self.operand_index = operand_index;
        }
        self.bound = Some(method);
        info!("Bound {} to {} renaming.", self.hotkey, method.describe());
    }

    /// Method-selection prompt. `Cancel` leaves the current binding untouched.
    pub fn select_method(
        &mut self,
        answer: MethodAnswer,
        operand_input: Option<&str>,
    ) -> Option<RenameMethod> {
        let method = match answer {
            MethodAnswer::Yes => RenameMethod::AddressBased,
            MethodAnswer::No => {
                let parsed = parse_operand_index(operand_input, self.operand_index);
                if parsed.invalid {
                    warn!("Invalid input. Using operand index {}.", parsed.index);
                }
                RenameMethod::operand(parsed.index)
            }
            MethodAnswer::Cancel => {
                info!("Operation cancelled.");
                return None;
            }
        };
        self.bind(method);
        Some(method)
    }

    /// Hotkey handler: rename through `host` with the bound method.
    pub fn on_hotkey<H, C>(&self, host: &mut H, clipboard: &C) -> Result<RenameOutcome, RenameError>
    where
        H: SymbolHost + ?Sized,
        C: ClipboardSource + ?Sized,
    {
        let method = self.bound.ok_or(RenameError::NoMethodSelected)?;
        rename_from_clipboard(host, clipboard, method, &self.suffixes)
    }
}
