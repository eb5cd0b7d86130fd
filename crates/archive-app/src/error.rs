//! Command failures of the binary.

use archive_chat::ChatError;
use archive_client::ClientError;

/// Errors a command can end with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Short message printed to the terminal.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Client(e) => e.user_message(),
            AppError::Chat(e) => e.user_message(),
            AppError::Io(e) => format!("File error: {}", e),
        }
    }
}
