#[cfg(feature = "capstone-backend")]
pub mod capstone;
#[cfg(feature = "rizin-backend")]
pub mod rizin;

#[cfg(feature = "capstone-backend")]
pub use capstone::{BinaryImage, ObjectSource};
#[cfg(feature = "rizin-backend")]
pub use rizin::RizinSource;

/// Architecture named by the object header, when an object parser is compiled in.
pub fn detect_arch(bytes: &[u8]) -> Option<String> {
    #[cfg(feature = "capstone-backend")]
    {
        capstone::arch_from_object(bytes)
    }
    #[cfg(not(feature = "capstone-backend"))]
    {
        let _ = bytes;
        None
    }
}
