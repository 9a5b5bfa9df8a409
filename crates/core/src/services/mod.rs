//! Rename flow, symbol import, and the tool-backed helpers they lean on.

pub mod backends;
pub mod rename;
pub mod sources;
