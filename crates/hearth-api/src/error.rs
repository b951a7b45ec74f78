//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping internal errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use hearth_chat::ChatError;
use hearth_llm::LlmError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - the model runtime misbehaved.
    BadGateway(String),
    /// 503 Service Unavailable - the model runtime is unreachable.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match &err {
            ChatError::InvalidArgument(_) => ApiError::BadRequest(err.to_string()),
            ChatError::SessionNotFound(_) | ChatError::MessageNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ChatError::Generation(LlmError::Protocol(_)) => ApiError::BadGateway(err.to_string()),
            ChatError::Generation(_) => ApiError::ServiceUnavailable(err.to_string()),
            ChatError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match &err {
            LlmError::Unavailable(_) | LlmError::Timeout => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            LlmError::Upstream { .. } | LlmError::Protocol(_) => {
                ApiError::BadGateway(err.to_string())
            }
        }
    }
}

impl From<hearth_core::error::HearthError> for ApiError {
    fn from(err: hearth_core::error::HearthError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_mapping() {
        let api: ApiError = ChatError::InvalidArgument("x".to_string()).into();
        assert!(matches!(api, ApiError::BadRequest(_)));

        let api: ApiError = ChatError::SessionNotFound(Uuid::new_v4()).into();
        assert!(matches!(api, ApiError::NotFound(_)));

        let api: ApiError = ChatError::Generation(LlmError::Protocol("bad".to_string())).into();
        assert!(matches!(api, ApiError::BadGateway(_)));

        let api: ApiError = ChatError::Generation(LlmError::Timeout).into();
        assert!(matches!(api, ApiError::ServiceUnavailable(_)));

        let api: ApiError = ChatError::Storage("oops".to_string()).into();
        assert!(matches!(api, ApiError::Internal(_)));
    }

    #[test]
    fn test_llm_error_mapping() {
        let api: ApiError = LlmError::Unavailable("refused".to_string()).into();
        assert!(matches!(api, ApiError::ServiceUnavailable(_)));

        let api: ApiError = LlmError::Upstream {
            status: 500,
            message: "err".to_string(),
        }
        .into();
        assert!(matches!(api, ApiError::BadGateway(_)));
    }
}
