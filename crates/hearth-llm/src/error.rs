//! Error types for the generation backend integration.

use hearth_core::error::HearthError;

/// Errors from the generation backend or the model-management client.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("cannot reach the model runtime: {0}")]
    Unavailable(String),
    #[error("request to the model runtime timed out")]
    Timeout,
    #[error("model runtime returned an error ({status}): {message}")]
    Upstream { status: u16, message: String },
    #[error("invalid response shape: {0}")]
    Protocol(String),
}

impl LlmError {
    /// Map a reqwest transport error onto the taxonomy.
    pub(crate) fn from_transport(base_url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else if err.is_connect() {
            LlmError::Unavailable(format!(
                "cannot connect to {} - is the model runtime running?",
                base_url
            ))
        } else {
            LlmError::Unavailable(err.to_string())
        }
    }
}

impl From<LlmError> for HearthError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Unavailable(_) | LlmError::Timeout | LlmError::Upstream { .. } => {
                HearthError::UpstreamUnavailable(err.to_string())
            }
            LlmError::Protocol(_) => HearthError::UpstreamProtocol(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = LlmError::Unavailable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "cannot reach the model runtime: connection refused"
        );

        let err = LlmError::Timeout;
        assert_eq!(err.to_string(), "request to the model runtime timed out");

        let err = LlmError::Upstream {
            status: 500,
            message: "model not loaded".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "model runtime returned an error (500): model not loaded"
        );

        let err = LlmError::Protocol("missing 'message.content'".to_string());
        assert_eq!(
            err.to_string(),
            "invalid response shape: missing 'message.content'"
        );
    }

    #[test]
    fn test_conversion_to_hearth_error() {
        let err: HearthError = LlmError::Timeout.into();
        assert!(matches!(err, HearthError::UpstreamUnavailable(_)));

        let err: HearthError = LlmError::Protocol("bad".to_string()).into();
        assert!(matches!(err, HearthError::UpstreamProtocol(_)));

        let err: HearthError = LlmError::Upstream {
            status: 502,
            message: "oops".to_string(),
        }
        .into();
        assert!(matches!(err, HearthError::UpstreamUnavailable(_)));
    }
}
