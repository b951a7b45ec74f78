//! Chat orchestrator: composes storage, retrieval, and generation.
//!
//! Each turn runs strictly sequentially: load recent history, retrieve
//! context, assemble the prompt, invoke generation, write back to the index,
//! persist the exchange, and update session metadata. Retrieval problems
//! never fail a turn; generation and persistence problems do.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hearth_core::types::{MessageRecord, SessionRecord, NEW_CHAT_TITLE};
use hearth_llm::GenerationProvider;
use hearth_retrieval::Retriever;
use hearth_storage::{Database, MessageRepository, SessionRepository};

use crate::error::ChatError;
use crate::prompt::{
    assemble_prompt, history_to_messages, truncate_title, HISTORY_WINDOW, RETRIEVAL_K,
};
use crate::types::{DeleteOutcome, EditOutcome, NewSession, SessionSummary, TurnOutcome};

/// Central coordinator for chat sessions and turns.
///
/// Holds no per-turn state; concurrent turns on different sessions are fully
/// independent. Turns on the same session are not mutually excluded - the
/// title claim is the only race-free step (single conditional update).
pub struct ChatOrchestrator {
    sessions: SessionRepository,
    messages: MessageRepository,
    retriever: Arc<dyn Retriever>,
    provider: Arc<dyn GenerationProvider>,
}

impl ChatOrchestrator {
    /// Create an orchestrator over the given database and providers.
    pub fn new(
        db: Arc<Database>,
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            sessions: SessionRepository::new(Arc::clone(&db)),
            messages: MessageRepository::new(db),
            retriever,
            provider,
        }
    }

    /// Create a new session bound to the given model.
    pub fn create_session(&self, model: &str) -> Result<NewSession, ChatError> {
        let model = model.trim();
        if model.is_empty() {
            return Err(ChatError::InvalidArgument(
                "model name is required".to_string(),
            ));
        }

        let now = Utc::now();
        let session = SessionRecord {
            id: Uuid::new_v4(),
            title: NEW_CHAT_TITLE.to_string(),
            model: model.to_string(),
            created_at: now,
            modified_at: now,
        };
        self.sessions.insert(&session)?;

        info!(session_id = %session.id, model, "Session created");
        Ok(NewSession {
            id: session.id,
            title: session.title,
            model: session.model,
        })
    }

    /// Run one turn: user query in, assistant response out.
    ///
    /// `model_override` takes precedence over the session's stored model for
    /// this turn only. The generation call blocks until the runtime responds;
    /// no timeout is imposed here beyond the HTTP client's own.
    pub async fn run_turn(
        &self,
        session_id: Uuid,
        query: &str,
        model_override: Option<&str>,
    ) -> Result<TurnOutcome, ChatError> {
        let session = self
            .sessions
            .find_by_id(session_id)?
            .ok_or(ChatError::SessionNotFound(session_id))?;

        let model = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| session.model.trim())
            .to_string();
        if model.is_empty() {
            return Err(ChatError::InvalidArgument(
                "no model available for this session".to_string(),
            ));
        }

        // Most recent turns, reversed back to chronological order.
        let mut recent = self.messages.recent_for_session(session_id, HISTORY_WINDOW)?;
        recent.reverse();
        let history = history_to_messages(&recent);

        // Retrieval is strictly best-effort: an uninitialized or failing
        // provider degrades to the no-context branch.
        let passages = if self.retriever.is_initialized() {
            let passages = self.retriever.retrieve(query, RETRIEVAL_K).await;
            if !passages.is_empty() {
                info!(
                    count = passages.len(),
                    "Retrieved relevant context passages"
                );
            }
            passages
        } else {
            debug!("Retriever uninitialized; skipping context retrieval");
            Vec::new()
        };
        let context_used = !passages.is_empty();

        let prompt = assemble_prompt(history, &passages, query);

        let reply = self.provider.generate(&model, &prompt).await?;

        // Write both sides of the exchange back into the index. Failures in
        // here are logged inside the retriever and must never fail the turn.
        self.retriever
            .add_document(
                query,
                serde_json::json!({
                    "type": "user_message",
                    "session_id": session_id.to_string(),
                }),
            )
            .await;
        self.retriever
            .add_document(
                &reply.content,
                serde_json::json!({
                    "type": "assistant_response",
                    "session_id": session_id.to_string(),
                }),
            )
            .await;

        // Commit the turn. A failure here loses the generated response;
        // accepted at-most-once behavior.
        let now = Utc::now();
        let record = MessageRecord {
            id: Uuid::new_v4(),
            session_id,
            user_message: query.to_string(),
            assistant_response: Some(reply.content.clone()),
            created_at: now,
            modified_at: now,
        };
        self.messages.insert(&record)?;

        // First completed turn claims the sentinel title. The conditional
        // update makes the claim race-free across concurrent turns.
        if self.sessions.claim_title(session_id, &truncate_title(query), now)? {
            debug!(session_id = %session_id, "Session title claimed from first message");
        }

        self.sessions.touch_modified(session_id, now)?;

        Ok(TurnOutcome {
            assistant_text: reply.content,
            model_used: model,
            context_used,
        })
    }

    /// Rename a session.
    ///
    /// Unlike deletion, a missing session here is an error: the caller named
    /// a session it expects to exist.
    pub fn edit_title(&self, session_id: Uuid, new_title: &str) -> Result<(), ChatError> {
        let new_title = new_title.trim();
        if new_title.is_empty() {
            return Err(ChatError::InvalidArgument("title is required".to_string()));
        }

        let updated = self
            .sessions
            .update_title(session_id, new_title, Utc::now())?;
        if !updated {
            return Err(ChatError::SessionNotFound(session_id));
        }
        Ok(())
    }

    /// Edit one or both fields of a stored turn.
    ///
    /// Refreshes the message's and the owning session's modified timestamps,
    /// never the title.
    pub fn edit_message(
        &self,
        message_id: Uuid,
        new_user_text: Option<&str>,
        new_assistant_text: Option<&str>,
    ) -> Result<EditOutcome, ChatError> {
        if new_user_text.is_none() && new_assistant_text.is_none() {
            return Err(ChatError::InvalidArgument(
                "at least one field must be provided for update".to_string(),
            ));
        }

        let message = self
            .messages
            .find_by_id(message_id)?
            .ok_or(ChatError::MessageNotFound(message_id))?;

        let now = Utc::now();
        self.messages
            .update_fields(message_id, new_user_text, new_assistant_text, now)?;

        // The owning session is guaranteed by the foreign key, but a
        // concurrent delete may have removed it; that is not an error.
        self.sessions.touch_modified(message.session_id, now)?;

        let fields_updated =
            new_user_text.is_some() as usize + new_assistant_text.is_some() as usize;
        info!(%message_id, fields_updated, "Message edited");

        Ok(EditOutcome {
            message_id,
            fields_updated,
        })
    }

    /// Delete a session and, via cascade, all its messages.
    pub fn delete_session(&self, session_id: Uuid) -> Result<DeleteOutcome, ChatError> {
        if self.sessions.delete(session_id)? {
            info!(%session_id, "Session deleted");
            Ok(DeleteOutcome::Deleted)
        } else {
            warn!(%session_id, "Delete requested for unknown session");
            Ok(DeleteOutcome::NotFound)
        }
    }

    /// All sessions, newest creation first.
    pub fn list_sessions(&self) -> Result<Vec<SessionSummary>, ChatError> {
        let sessions = self.sessions.list_all()?;
        Ok(sessions.into_iter().map(summarize).collect())
    }

    /// Sessions bound to one model, newest creation first.
    pub fn list_sessions_by_model(&self, model: &str) -> Result<Vec<SessionSummary>, ChatError> {
        let sessions = self.sessions.list_by_model(model)?;
        Ok(sessions.into_iter().map(summarize).collect())
    }

    /// Full message history for a session, oldest first.
    ///
    /// An unknown session yields an empty sequence, not an error.
    pub fn get_history(&self, session_id: Uuid) -> Result<Vec<MessageRecord>, ChatError> {
        Ok(self.messages.list_for_session(session_id)?)
    }

    /// Look up one session.
    pub fn get_session(&self, session_id: Uuid) -> Result<Option<SessionRecord>, ChatError> {
        Ok(self.sessions.find_by_id(session_id)?)
    }
}

fn summarize(session: SessionRecord) -> SessionSummary {
    SessionSummary {
        id: session.id,
        title: session.title,
        model: session.model,
        created_at: session.created_at,
    }
}

// =============================================================================
// Tests
// =============================================================================
