//! The generation provider contract and its Ollama implementation.
//!
//! `OllamaProvider` speaks the `/api/chat` endpoint of a local
//! Ollama-compatible runtime with streaming disabled. The call blocks the
//! calling task until the runtime responds; the only timeout is the HTTP
//! client's own, configured at construction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use hearth_core::error::HearthError;
use hearth_core::types::PromptMessage;

use crate::error::LlmError;

/// One generated assistant message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReply {
    pub content: String,
}

/// Contract for the generation backend.
///
/// Implementations take the full role-tagged message list and return exactly
/// one generated message, synchronously from the caller's point of view.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<GenerationReply, LlmError>;
}

/// Wire format for the chat request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Generation provider backed by a local Ollama-compatible runtime.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    base_url: String,
    client: Client,
}

impl OllamaProvider {
    /// Create a provider for the runtime at `base_url`.
    ///
    /// `timeout_secs` bounds the whole HTTP round-trip; generation on CPU
    /// can take minutes, so the default config uses a generous value.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, HearthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HearthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl GenerationProvider for OllamaProvider {
    async fn generate(
        &self,
        model: &str,
        messages: &[PromptMessage],
    ) -> Result<GenerationReply, LlmError> {
        let request = ChatRequest {
            model,
            stream: false,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: &m.content,
                })
                .collect(),
        };

        debug!(
            model,
            message_count = messages.len(),
            total_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Sending chat request"
        );

        let url = format!("{}/api/chat", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        // The runtime's reply must carry message.content with textual
        // content; anything else is a protocol violation and the turn
        // must not be committed.
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("unparseable response body: {}", e)))?;

        let content = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| LlmError::Protocol("missing 'message.content'".to_string()))?;

        Ok(GenerationReply {
            content: content.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_core::types::ChatRole;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_messages() -> Vec<PromptMessage> {
        vec![
            PromptMessage::user("earlier question"),
            PromptMessage::assistant("earlier answer"),
            PromptMessage::user("What is 2+2?"),
        ]
    }

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let provider = OllamaProvider::new("http://localhost:11434/", 300).unwrap();
        assert_eq!(provider.base_url, "http://localhost:11434");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "llama3",
            stream: false,
            messages: vec![
                WireMessage {
                    role: ChatRole::System.as_str(),
                    content: "context",
                },
                WireMessage {
                    role: ChatRole::User.as_str(),
                    content: "question",
                },
            ],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama3");
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "question");
    }

    #[tokio::test]
    async fn test_generate_happy_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "llama3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "4"},
                "done": true
            })))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), 10).unwrap();
        let reply = provider
            .generate("llama3", &sample_messages())
            .await
            .unwrap();
        assert_eq!(reply.content, "4");
    }

    #[tokio::test]
    async fn test_generate_missing_content_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": {"role": "assistant"}})),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), 10).unwrap();
        let err = provider
            .generate("llama3", &sample_messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_generate_missing_message_is_protocol_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "model not found"})),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), 10).unwrap();
        let err = provider
            .generate("llama3", &sample_messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_generate_http_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri(), 10).unwrap();
        let err = provider
            .generate("llama3", &sample_messages())
            .await
            .unwrap_err();
        match err {
            LlmError::Upstream { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "model crashed");
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_unreachable_runtime() {
        // Nothing listens on this port.
        let provider = OllamaProvider::new("http://127.0.0.1:1", 2).unwrap();
        let err = provider
            .generate("llama3", &sample_messages())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_) | LlmError::Timeout));
    }
}
