pub mod config;
pub mod error;
pub mod types;

pub use config::ArchiveConfig;
pub use error::{ArchiveError, Result};
pub use types::*;
