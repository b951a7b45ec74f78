//! Error types for conversation orchestration.

use uuid::Uuid;

use hearth_core::error::HearthError;
use hearth_llm::LlmError;

/// Errors from the chat orchestrator.
///
/// Retrieval never appears here: retrieval failures degrade to the
/// no-context branch and index write-back failures are swallowed.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),
    #[error("message not found: {0}")]
    MessageNotFound(Uuid),
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<HearthError> for ChatError {
    fn from(err: HearthError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        let err = ChatError::InvalidArgument("model name is required".to_string());
        assert_eq!(err.to_string(), "invalid argument: model name is required");

        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let err = ChatError::SessionNotFound(id);
        assert_eq!(
            err.to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );

        let err = ChatError::MessageNotFound(id);
        assert_eq!(
            err.to_string(),
            "message not found: 550e8400-e29b-41d4-a716-446655440000"
        );

        let err = ChatError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_generation_error_wraps_llm_error() {
        let err: ChatError = LlmError::Protocol("missing 'message.content'".to_string()).into();
        assert!(matches!(err, ChatError::Generation(LlmError::Protocol(_))));
        assert!(err.to_string().contains("invalid response shape"));
    }

    #[test]
    fn test_from_hearth_error() {
        let err: ChatError = HearthError::Storage("connection lost".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
        assert!(err.to_string().contains("connection lost"));
    }
}
