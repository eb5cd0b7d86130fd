//! The `{ success, data, message }` wrapper every backend response uses.

use serde::Deserialize;

use crate::error::ClientError;

/// Response envelope shared by all backend endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Unwrap the payload, turning `success: false` into [`ClientError::Backend`].
    pub fn into_data(self) -> Result<T, ClientError> {
        self.check()?;
        self.data
            .ok_or_else(|| ClientError::Decode("response envelope has no data".to_string()))
    }

    /// Like [`into_data`](Self::into_data) for endpoints whose `data` may be
    /// null or omitted.
    pub fn into_optional(self) -> Result<Option<T>, ClientError> {
        self.check()?;
        Ok(self.data)
    }

    fn check(&self) -> Result<(), ClientError> {
        if self.success {
            return Ok(());
        }
        let reason = self
            .message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_default();
        Err(ClientError::Backend(reason))
    }
}
