use thiserror::Error;

/// Top-level error type for the contract archive client.
///
/// Covers the concerns owned by this crate (configuration and local I/O).
/// Network and conversation errors live in their own crates.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Short message suitable for showing to an end user.
    pub fn user_message(&self) -> String {
        match self {
            ArchiveError::Config(_) => "The configuration file could not be used.".to_string(),
            ArchiveError::Io(_) => "A local file could not be read or written.".to_string(),
        }
    }
}

impl From<toml::de::Error> for ArchiveError {
    fn from(err: toml::de::Error) -> Self {
        ArchiveError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ArchiveError {
    fn from(err: toml::ser::Error) -> Self {
        ArchiveError::Config(err.to_string())
    }
}

/// A specialized `Result` type for archive core operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
