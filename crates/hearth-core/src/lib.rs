//! Hearth core crate - shared error type, configuration, and domain types.
//!
//! Every other Hearth crate depends on this one. It defines the central
//! `HearthError`, the TOML-backed `HearthConfig`, and the session/message
//! records exchanged between storage, orchestration, and transport.

pub mod config;
pub mod error;
pub mod types;

pub use config::HearthConfig;
pub use error::{HearthError, Result};
pub use types::{ChatRole, MessageRecord, PromptMessage, SessionRecord};
