//! Conversation orchestration for Hearth.
//!
//! The orchestrator composes storage, retrieval, and generation into chat
//! turns: it loads recent history, retrieves context, assembles the prompt,
//! invokes the generation backend, and commits the exchange with consistent
//! session/title/timestamp bookkeeping.

pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod types;

pub use error::ChatError;
pub use orchestrator::ChatOrchestrator;
pub use types::{DeleteOutcome, EditOutcome, NewSession, SessionSummary, TurnOutcome};
