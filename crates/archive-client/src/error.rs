//! Error types for calls against the archive backend.
//!
//! Three kinds of failure reach callers: the request never completed
//! (transport), the server answered with a non-success status, or the
//! server answered `success: false` inside the response envelope. Missing
//! optional fields are not errors; the wire schema defaults them.

use archive_core::ContractId;

/// Errors from the REST client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("backend reported failure: {0}")]
    Backend(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("contract {contract_id} still processing after {attempts} status checks")]
    PollingExhausted {
        contract_id: ContractId,
        attempts: u32,
    },
}

impl ClientError {
    /// Whether the backend said the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Status { status: 404, .. })
    }

    /// Short message suitable for showing to an end user.
    ///
    /// Backend-provided text is only passed through for envelope failures
    /// and client-side (4xx) rejections, which carry a human-readable reason.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Transport(_) => "Service unavailable, please retry.".to_string(),
            ClientError::Status { status, message } if (400..500).contains(status) => {
                if message.trim().is_empty() {
                    if *status == 404 {
                        "The requested item was not found.".to_string()
                    } else {
                        format!("The request was rejected (HTTP {}).", status)
                    }
                } else {
                    message.clone()
                }
            }
            ClientError::Status { status, .. } => {
                format!("The server could not complete the request (HTTP {}).", status)
            }
            ClientError::Backend(msg) if !msg.trim().is_empty() => msg.clone(),
            ClientError::Backend(_) => "The server could not complete the request.".to_string(),
            ClientError::Decode(_) => "Unexpected response from the server.".to_string(),
            ClientError::Io(_) => "A local file could not be read.".to_string(),
            ClientError::InvalidUrl(_) => "The server address is not valid.".to_string(),
            ClientError::PollingExhausted { contract_id, .. } => format!(
                "Contract {} is still being processed, check again later.",
                contract_id
            ),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else if err.is_builder() {
            ClientError::InvalidUrl(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_display() {
        let err = ClientError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");

        let err = ClientError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: boom");

        let err = ClientError::PollingExhausted {
            contract_id: 9,
            attempts: 3,
        };
        assert_eq!(
            err.to_string(),
            "contract 9 still processing after 3 status checks"
        );
    }

    #[test]
    fn test_transport_user_message_is_fallback() {
        let err = ClientError::Transport("dns error: no such host".to_string());
        assert_eq!(err.user_message(), "Service unavailable, please retry.");
    }

    #[test]
    fn test_server_error_hides_raw_detail() {
        let err = ClientError::Status {
            status: 500,
            message: "问答处理失败: Traceback (most recent call last)".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("500"));
        assert!(!msg.contains("Traceback"));
    }

    #[test]
    fn test_client_rejection_passes_detail_through() {
        let err = ClientError::Status {
            status: 404,
            message: "会话不存在".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.user_message(), "会话不存在");

        let err = ClientError::Status {
            status: 404,
            message: String::new(),
        };
        assert_eq!(err.user_message(), "The requested item was not found.");
    }

    #[test]
    fn test_backend_failure_message() {
        let err = ClientError::Backend("删除失败".to_string());
        assert_eq!(err.user_message(), "删除失败");

        let err = ClientError::Backend("  ".to_string());
        assert_eq!(
            err.user_message(),
            "The server could not complete the request."
        );
    }

    #[test]
    fn test_json_error_maps_to_decode() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: ClientError = json_err.into();
        assert!(matches!(err, ClientError::Decode(_)));
        assert!(!err.is_not_found());
    }
}
