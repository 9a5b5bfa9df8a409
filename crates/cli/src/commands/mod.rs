pub mod binaries;
pub mod project;
pub mod rename;
pub mod sources;
pub mod symbols;
pub mod util;

pub use binaries::*;
pub use project::*;
pub use rename::*;
pub use sources::*;
pub use symbols::*;
pub use util::*;
