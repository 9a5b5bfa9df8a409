use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clipboard::{ClipboardError, ClipboardSource};
use crate::host::{HostError, SymbolHost};
use crate::naming::{sanitize_with, try_disambiguate, SuffixMap};

/// Operand index used when none is configured (the second operand).
pub const DEFAULT_OPERAND_INDEX: usize = 1;

/// How the rename target is resolved from the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenameMethod {
    /// Rename whatever sits at the cursor address.
    AddressBased,
    /// Decode the instruction at the cursor and rename the address held by one of its operands.
    OperandBased { operand_index: usize },
}

impl RenameMethod {
    pub fn operand(operand_index: usize) -> Self {
        RenameMethod::OperandBased { operand_index }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RenameMethod::AddressBased => "address",
            RenameMethod::OperandBased { .. } => "operand",
        }
    }

    /// Human-readable label, e.g. for history listings.
    pub fn describe(&self) -> String {
        match self {
            RenameMethod::AddressBased => "address-based".to_string(),
            RenameMethod::OperandBased { operand_index } => {
                format!("operand-based (operand {operand_index})")
            }
        }
    }
}

/// Result of a successful rename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameOutcome {
    /// Address that received the new name.
    pub address: u64,
    /// Name bound to `address` before the rename, if any.
    pub previous_name: Option<String>,
    /// Name actually written (after suffixing).
    pub new_name: String,
    /// Sanitized clipboard text before collision avoidance.
    pub sanitized: String,
    /// Raw clipboard text.
    pub clipboard_text: String,
    /// Whether a numeric suffix had to be appended.
    pub collided: bool,
}

#[derive(Debug, Error)]
pub enum RenameError {
    #[error("No name copied. Please copy a function name first.")]
    EmptyClipboard,
    #[error("No cursor address available.")]
    NoCursor,
    #[error("No valid pointer found in the instruction at operand index {operand_index}.")]
    InvalidOperand { operand_index: usize },
    #[error("No rename method selected. Choose address-based or operand-based renaming first.")]
    NoMethodSelected,
    #[error("Failed to rename function at 0x{address:X} to {name}")]
    RenameFailed { address: u64, name: String },
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Host(#[from] HostError),
}

/// Rename the target selected by `method` using the current clipboard text.
///
/// The collision probe covers the whole namespace, including the target's own
/// current name.
pub fn rename_from_clipboard<H, C>(
    host: &mut H,
    clipboard: &C,
    method: RenameMethod,
    suffixes: &SuffixMap,
) -> Result<RenameOutcome, RenameError>
where
    H: SymbolHost + ?Sized,
    C: ClipboardSource + ?Sized,
{
    let clipboard_text = clipboard.paste()?;
    if clipboard_text.is_empty() {
        warn!("{}", RenameError::EmptyClipboard);
        return Err(RenameError::EmptyClipboard);
    }

    let cursor = host.cursor_address().ok_or(RenameError::NoCursor)?;
    let address = match method {
        RenameMethod::AddressBased => cursor,
        RenameMethod::OperandBased { operand_index } => {
            match host.operand_value(cursor, operand_index)? {
                Some(value) => value,
                None => {
                    let err = RenameError::InvalidOperand { operand_index };
                    warn!(cursor = format_args!("0x{cursor:X}"), "{err}");
                    return Err(err);
                }
            }
        }
    };
    debug!(
        method = method.as_str(),
        address = format_args!("0x{address:X}"),
        "resolved rename target"
    );

    let sanitized = sanitize_with(&clipboard_text, suffixes);
    let new_name = try_disambiguate(&sanitized, |candidate| host.name_exists(candidate))?;
    let collided = new_name != sanitized;
    if collided {
        info!("Name '{sanitized}' already exists. Adding suffix.");
    }

    let previous_name = host.name_at(address)?;
    if !host.set_name(address, &new_name)? {
        let err = RenameError::RenameFailed { address, name: new_name };
        warn!("{err}");
        return Err(err);
    }

    info!("Renamed function at 0x{address:X} to {new_name}");
    Ok(RenameOutcome { address, previous_name, new_name, sanitized, clipboard_text, collided })
}
