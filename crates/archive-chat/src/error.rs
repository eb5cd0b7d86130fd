//! Error types for the conversational search engine.

use archive_client::ClientError;
use archive_core::MessageId;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("a request is already in progress")]
    Busy,
    #[error("unknown message: {0}")]
    UnknownMessage(MessageId),
    #[error("feedback not allowed: {0}")]
    FeedbackNotAllowed(&'static str),
    #[error("feedback already recorded for message {0}")]
    FeedbackAlreadySet(MessageId),
    #[error(transparent)]
    Client(#[from] ClientError),
}

impl ChatError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::EmptyMessage => "Please enter a question.".to_string(),
            ChatError::MessageTooLong(max) => {
                format!("Questions are limited to {} characters.", max)
            }
            ChatError::Busy => "Still waiting for the previous answer.".to_string(),
            ChatError::UnknownMessage(_) => "That message no longer exists.".to_string(),
            ChatError::FeedbackNotAllowed(_) => {
                "Feedback is only possible on saved answers.".to_string()
            }
            ChatError::FeedbackAlreadySet(_) => {
                "You have already rated this answer.".to_string()
            }
            ChatError::Client(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::UnknownMessage(MessageId::new("m1")).to_string(),
            "unknown message: m1"
        );
        assert_eq!(
            ChatError::FeedbackNotAllowed("no session").to_string(),
            "feedback not allowed: no session"
        );
    }

    #[test]
    fn test_client_error_is_transparent() {
        let err: ChatError = ClientError::Backend("删除会话失败".to_string()).into();
        assert!(matches!(err, ChatError::Client(_)));
        assert_eq!(err.to_string(), ClientError::Backend("删除会话失败".to_string()).to_string());
        assert_eq!(err.user_message(), "删除会话失败");
    }

    #[test]
    fn test_user_messages_hide_ids() {
        let err = ChatError::FeedbackAlreadySet(MessageId::new("0192-internal"));
        assert!(!err.user_message().contains("0192"));
        assert!(ChatError::MessageTooLong(10).user_message().contains("10"));
    }
}
