// Public modules
pub mod bench;
pub mod config;
pub mod error;
pub mod flavor;
pub mod git;
pub mod step;

// Internal modules - not part of public API
pub(crate) mod paths;

// Re-export common types for convenience
pub use error::{Error, ErrorCode, Result};
