//! Generation backend integration for Hearth.
//!
//! Implements the `GenerationProvider` contract over an Ollama-compatible
//! local runtime, plus a model-management client (list, inspect, remove,
//! running, pull) proxying the same runtime's HTTP API.

pub mod error;
pub mod models;
pub mod provider;

pub use error::LlmError;
pub use models::{LocalModel, OllamaClient, PullStatus};
pub use provider::{GenerationProvider, GenerationReply, OllamaProvider};
