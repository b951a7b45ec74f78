use thiserror::Error;

/// Top-level error type for the Hearth system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define
/// their own error types and implement `From<SubsystemError> for HearthError`
/// so that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HearthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation backend unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Generation backend protocol error: {0}")]
    UpstreamProtocol(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for HearthError {
    fn from(err: toml::de::Error) -> Self {
        HearthError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HearthError {
    fn from(err: toml::ser::Error) -> Self {
        HearthError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HearthError {
    fn from(err: serde_json::Error) -> Self {
        HearthError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Hearth operations.
pub type Result<T> = std::result::Result<T, HearthError>;
