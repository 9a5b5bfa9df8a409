use std::path::Path;

use crate::db::ProjectDb;
use crate::host::{HostError, SymbolHost};
use crate::naming::is_valid_symbol_name;

#[cfg(feature = "capstone-backend")]
use crate::services::backends::BinaryImage;

/// [`SymbolHost`] over one binary's namespace in the project database.
pub struct ProjectHost<'a> {
    db: &'a ProjectDb,
    binary: String,
    cursor: Option<u64>,
    #[cfg(feature = "capstone-backend")]
    image: Option<BinaryImage>,
}

impl<'a> ProjectHost<'a> {
    pub fn new(db: &'a ProjectDb, binary: impl Into<String>) -> Self {
        Self {
            db,
            binary: binary.into(),
            cursor: None,
            #[cfg(feature = "capstone-backend")]
            image: None,
        }
    }

    pub fn with_cursor(mut self, address: u64) -> Self {
        self.cursor = Some(address);
        self
    }

    /// Attach the loaded binary so operand-based renames can decode instructions.
    #[cfg(feature = "capstone-backend")]
    pub fn with_image(mut self, image: BinaryImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Load `path` for operand decoding. Without a decoder compiled in this is a no-op
    /// and operand-based renames report `HostError::Unsupported`.
    pub fn with_binary_file(self, path: &Path, arch: Option<&str>) -> Result<Self, HostError> {
        #[cfg(feature = "capstone-backend")]
        {
            Ok(self.with_image(BinaryImage::load(path, arch)?))
        }
        #[cfg(not(feature = "capstone-backend"))]
        {
            let _ = (path, arch);
            Ok(self)
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

fn storage(err: crate::db::DbError) -> HostError {
    HostError::Storage(err.to_string())
}

impl SymbolHost for ProjectHost<'_> {
    fn cursor_address(&self) -> Option<u64> {
        self.cursor
    }

    #[cfg(feature = "capstone-backend")]
    fn operand_value(&self, address: u64, operand_index: usize) -> Result<Option<u64>, HostError> {
        match &self.image {
            Some(image) => image.operand_value(address, operand_index),
            None => Err(HostError::Unsupported(format!(
                "no binary image loaded for {}; operand decoding unavailable",
                self.binary
            ))),
        }
    }

    #[cfg(not(feature = "capstone-backend"))]
    fn operand_value(&self, _address: u64, _operand_index: usize) -> Result<Option<u64>, HostError> {
        Err(HostError::Unsupported(
            "operand decoding requires the capstone-backend feature".to_string(),
        ))
    }

    fn name_exists(&self, name: &str) -> Result<bool, HostError> {
        Ok(self.db.address_of(&self.binary, name).map_err(storage)?.is_some())
    }

    fn name_at(&self, address: u64) -> Result<Option<String>, HostError> {
        self.db.symbol_at(&self.binary, address).map_err(storage)
    }

    fn set_name(&mut self, address: u64, name: &str) -> Result<bool, HostError> {
        if !is_valid_symbol_name(name) {
            return Ok(false);
        }
        match self.db.address_of(&self.binary, name).map_err(storage)? {
            Some(bound) if bound != address => return Ok(false),
            _ => {}
        }
        self.db.upsert_symbol_name(&self.binary, address, name).map_err(storage)?;
        Ok(true)
    }
}
