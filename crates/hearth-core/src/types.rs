use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel title assigned to every new session.
///
/// A session keeps this title until its first completed turn, at which point
/// the title becomes the first user message (truncated).
pub const NEW_CHAT_TITLE: &str = "New Chat";

// =============================================================================
// Enums
// =============================================================================

/// Role tag attached to a prompt message sent to the generation backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Instructions injected by the orchestrator (retrieved context).
    System,
    /// Text typed by the user.
    User,
    /// Text produced by the model.
    Assistant,
}

impl ChatRole {
    /// Wire name used by the Ollama chat API.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

// =============================================================================
// Prompt assembly
// =============================================================================

/// One role-tagged entry in the message list sent to the generation backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: ChatRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Persistent records
// =============================================================================

/// A persisted chat session.
///
/// The title starts as [`NEW_CHAT_TITLE`] and is claimed exactly once by the
/// first completed turn. `modified_at` is refreshed on every successful turn
/// and every edit, and never moves backwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: Uuid,
    pub title: String,
    /// Generation backend model bound to this session (e.g. "llama3").
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// One conversation turn: a user message and its (possibly pending) response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_message: String,
    /// May be absent while a response is pending or was never produced.
    pub assistant_response: Option<String>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_role_wire_names() {
        assert_eq!(ChatRole::System.as_str(), "system");
        assert_eq!(ChatRole::User.as_str(), "user");
        assert_eq!(ChatRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_chat_role_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ChatRole::Assistant).unwrap(),
            "\"assistant\""
        );
        let role: ChatRole = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, ChatRole::System);
    }

    #[test]
    fn test_prompt_message_constructors() {
        let msg = PromptMessage::user("hello");
        assert_eq!(msg.role, ChatRole::User);
        assert_eq!(msg.content, "hello");

        let msg = PromptMessage::system("context");
        assert_eq!(msg.role, ChatRole::System);

        let msg = PromptMessage::assistant("reply");
        assert_eq!(msg.role, ChatRole::Assistant);
    }

    #[test]
    fn test_prompt_message_serde_roundtrip() {
        let msg = PromptMessage::user("what is 2+2?");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"user\""));
        let back: PromptMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn test_session_record_serde() {
        let session = SessionRecord {
            id: Uuid::new_v4(),
            title: NEW_CHAT_TITLE.to_string(),
            model: "llama3".to_string(),
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }

    #[test]
    fn test_message_record_nullable_response() {
        let msg = MessageRecord {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            user_message: "hi".to_string(),
            assistant_response: None,
            created_at: Utc::now(),
            modified_at: Utc::now(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"assistant_response\":null"));
    }
}
