//! Result types returned by the orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of creating a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    pub id: Uuid,
    /// Always the sentinel title at creation time.
    pub title: String,
    pub model: String,
}

/// Result of one completed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnOutcome {
    pub assistant_text: String,
    /// The model that actually served the turn (override or session model).
    pub model_used: String,
    /// Whether retrieved context was injected into the prompt.
    pub context_used: bool,
}

/// Result of editing a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOutcome {
    pub message_id: Uuid,
    /// How many of the two editable fields were updated (1 or 2).
    pub fields_updated: usize,
}

/// Result of deleting a session.
///
/// Absence is a reportable outcome, not an error: deleting an unknown
/// session succeeds with `NotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

impl DeleteOutcome {
    pub fn deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }

    /// Human-readable description of the outcome.
    pub fn message(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted => "session deleted",
            DeleteOutcome::NotFound => "no session found with that id",
        }
    }
}

/// Projection of a session for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}
