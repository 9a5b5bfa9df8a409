//! clip-rename-core
//!
//! Core library for renaming functions and symbols from clipboard text.
//!
//! This crate holds the name sanitization and collision-avoidance logic, the
//! host abstraction a rename is applied through, the clipboard readers, the
//! hotkey-bound plugin controller, and a SQLite-backed project host.
//!
//! The goal is to keep all substantive logic here so it is fully testable and
//! reusable from multiple frontends (CLI, disassembler plugins, etc.).

pub mod clipboard;
pub mod db;
pub mod host;
pub mod logging;
pub mod naming;
pub mod plugin;
pub mod services;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
