//! Host abstraction.
//!
//! A host owns the address space, the symbol namespace and the notion of a
//! cursor. Renames never touch storage directly; they go through this trait so
//! the same flow runs against the project database, an in-memory table, or a
//! disassembler's own API.

use std::collections::{BTreeMap, HashMap};

use thiserror::Error;

use crate::naming::is_valid_symbol_name;

#[derive(Debug, Error)]
pub enum HostError {
    /// The host cannot answer this kind of query (e.g. no decoder configured).
    #[error("Unsupported host operation: {0}")]
    Unsupported(String),
    /// Instruction decoding failed at the requested address.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The backing store rejected a read or write.
    #[error("Host storage error: {0}")]
    Storage(String),
}

/// Symbol namespace + cursor + name mutation, as seen by a rename.
pub trait SymbolHost {
    /// The address under the cursor, if any.
    fn cursor_address(&self) -> Option<u64>;

    /// Value of operand `operand_index` (0-based) of the instruction at `address`.
    ///
    /// `Ok(None)` means the operand exists but carries no usable address
    /// (register operand, missing operand, etc.).
    fn operand_value(&self, address: u64, operand_index: usize) -> Result<Option<u64>, HostError>;

    /// Whether `name` is already bound anywhere in the namespace.
    fn name_exists(&self, name: &str) -> Result<bool, HostError>;

    /// Current name at `address`, if any.
    fn name_at(&self, address: u64) -> Result<Option<String>, HostError>;

    /// Bind `name` to `address`. `Ok(false)` means the host refused the name.
    fn set_name(&mut self, address: u64, name: &str) -> Result<bool, HostError>;
}

/// In-memory host, handy for embedding and for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryHost {
    cursor: Option<u64>,
    names: BTreeMap<u64, String>,
    operands: HashMap<(u64, usize), u64>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cursor(mut self, address: u64) -> Self {
        self.cursor = Some(address);
        self
    }

    pub fn set_cursor(&mut self, address: Option<u64>) {
        self.cursor = address;
    }

    /// Seed a symbol without going through validation.
    pub fn with_symbol(mut self, address: u64, name: impl Into<String>) -> Self {
        self.names.insert(address, name.into());
        self
    }

    /// Register operand `operand_index` of the instruction at `address` as pointing at `value`.
    pub fn with_operand(mut self, address: u64, operand_index: usize, value: u64) -> Self {
        self.operands.insert((address, operand_index), value);
        self
    }

    pub fn symbols(&self) -> &BTreeMap<u64, String> {
        &self.names
    }
}

impl SymbolHost for MemoryHost {
    fn cursor_address(&self) -> Option<u64> {
        self.cursor
    }

    fn operand_value(&self, address: u64, operand_index: usize) -> Result<Option<u64>, HostError> {
        Ok(self.operands.get(&(address, operand_index)).copied())
    }

    fn name_exists(&self, name: &str) -> Result<bool, HostError> {
        Ok(self.names.values().any(|existing| existing == name))
    }

    fn name_at(&self, address: u64) -> Result<Option<String>, HostError> {
        Ok(self.names.get(&address).cloned())
    }

    fn set_name(&mut self, address: u64, name: &str) -> Result<bool, HostError> {
        if !is_valid_symbol_name(name) {
            return Ok(false);
        }
        let taken_elsewhere =
            self.names.iter().any(|(addr, existing)| *addr != address && existing == name);
        if taken_elsewhere {
            return Ok(false);
        }
        self.names.insert(address, name.to_string());
        Ok(true)
    }
}
