//! Repository implementations for SQLite-backed persistence.
//!
//! Provides SessionRepository, MessageRepository, and DocumentRepository
//! that operate on the Database struct using raw SQL.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use rusqlite::Row;
use uuid::Uuid;

use hearth_core::error::HearthError;
use hearth_core::types::{MessageRecord, SessionRecord, NEW_CHAT_TITLE};

use crate::db::Database;

/// Convert an epoch-milliseconds column to a UTC datetime.
fn ts_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}

fn row_to_session(row: &Row) -> Result<SessionRecord, HearthError> {
    let id: String = row
        .get(0)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let title: String = row
        .get(1)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let model: String = row
        .get(2)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let created_at: i64 = row
        .get(3)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let modified_at: i64 = row
        .get(4)
        .map_err(|e| HearthError::Storage(e.to_string()))?;

    Ok(SessionRecord {
        id: Uuid::parse_str(&id)
            .map_err(|e| HearthError::Storage(format!("Invalid session id: {}", e)))?,
        title,
        model,
        created_at: ts_to_datetime(created_at),
        modified_at: ts_to_datetime(modified_at),
    })
}

fn row_to_message(row: &Row) -> Result<MessageRecord, HearthError> {
    let id: String = row
        .get(0)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let session_id: String = row
        .get(1)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let user_message: String = row
        .get(2)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let assistant_response: Option<String> = row
        .get(3)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let created_at: i64 = row
        .get(4)
        .map_err(|e| HearthError::Storage(e.to_string()))?;
    let modified_at: i64 = row
        .get(5)
        .map_err(|e| HearthError::Storage(e.to_string()))?;

    Ok(MessageRecord {
        id: Uuid::parse_str(&id)
            .map_err(|e| HearthError::Storage(format!("Invalid message id: {}", e)))?,
        session_id: Uuid::parse_str(&session_id)
            .map_err(|e| HearthError::Storage(format!("Invalid session id: {}", e)))?,
        user_message,
        assistant_response,
        created_at: ts_to_datetime(created_at),
        modified_at: ts_to_datetime(modified_at),
    })
}

const SESSION_COLUMNS: &str = "id, title, model, created_at, modified_at";
const MESSAGE_COLUMNS: &str =
    "id, session_id, user_message, assistant_response, created_at, modified_at";

/// Per-model usage counts for the stats endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelUsageRow {
    pub model: String,
    pub sessions: u64,
    pub messages: u64,
}

/// Repository for chat sessions.
pub struct SessionRepository {
    db: Arc<Database>,
}

impl SessionRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new session row.
    pub fn insert(&self, session: &SessionRecord) -> Result<(), HearthError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_sessions (id, title, model, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    session.id.to_string(),
                    session.title,
                    session.model,
                    session.created_at.timestamp_millis(),
                    session.modified_at.timestamp_millis(),
                ],
            )
            .map_err(|e| HearthError::Storage(format!("Failed to insert session: {}", e)))?;
            Ok(())
        })
    }

    /// Find a session by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<SessionRecord>, HearthError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM chat_sessions WHERE id = ?1",
                    SESSION_COLUMNS
                ))
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_session(row))
                })
                .optional()
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            match result {
                Some(session) => Ok(Some(session?)),
                None => Ok(None),
            }
        })
    }

    /// Check whether a session exists.
    pub fn exists(&self, id: Uuid) -> Result<bool, HearthError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM chat_sessions WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| HearthError::Storage(e.to_string()))?;
            Ok(count > 0)
        })
    }

    /// List all sessions, newest creation first.
    pub fn list_all(&self) -> Result<Vec<SessionRecord>, HearthError> {
        self.query_sessions(
            &format!(
                "SELECT {} FROM chat_sessions ORDER BY created_at DESC, rowid DESC",
                SESSION_COLUMNS
            ),
            rusqlite::params![],
        )
    }

    /// List sessions bound to a given model, newest creation first.
    pub fn list_by_model(&self, model: &str) -> Result<Vec<SessionRecord>, HearthError> {
        self.query_sessions(
            &format!(
                "SELECT {} FROM chat_sessions WHERE model = ?1 ORDER BY created_at DESC, rowid DESC",
                SESSION_COLUMNS
            ),
            rusqlite::params![model],
        )
    }

    fn query_sessions(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<SessionRecord>, HearthError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(params, |row| Ok(row_to_session(row)))
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let mut sessions = Vec::new();
            for row in rows {
                let session = row.map_err(|e| HearthError::Storage(e.to_string()))??;
                sessions.push(session);
            }
            Ok(sessions)
        })
    }

    /// Claim the sentinel title with a single atomic conditional update.
    ///
    /// Returns true when this call won the claim (the title was still the
    /// sentinel). Concurrent first turns on one session cannot both win.
    pub fn claim_title(
        &self,
        id: Uuid,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, HearthError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE chat_sessions SET title = ?1, modified_at = ?2
                     WHERE id = ?3 AND title = ?4",
                    rusqlite::params![title, now.timestamp_millis(), id.to_string(), NEW_CHAT_TITLE],
                )
                .map_err(|e| HearthError::Storage(format!("Failed to claim title: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Overwrite the title unconditionally. Returns false if no such session.
    pub fn update_title(
        &self,
        id: Uuid,
        title: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, HearthError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE chat_sessions SET title = ?1, modified_at = ?2 WHERE id = ?3",
                    rusqlite::params![title, now.timestamp_millis(), id.to_string()],
                )
                .map_err(|e| HearthError::Storage(format!("Failed to update title: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Refresh the session's modified timestamp. Returns false if no such session.
    pub fn touch_modified(&self, id: Uuid, now: DateTime<Utc>) -> Result<bool, HearthError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE chat_sessions SET modified_at = ?1 WHERE id = ?2",
                    rusqlite::params![now.timestamp_millis(), id.to_string()],
                )
                .map_err(|e| HearthError::Storage(format!("Failed to touch session: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Delete a session. Messages cascade via the foreign key.
    ///
    /// Returns true when a row was actually deleted.
    pub fn delete(&self, id: Uuid) -> Result<bool, HearthError> {
        self.db.with_conn(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM chat_sessions WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                )
                .map_err(|e| HearthError::Storage(format!("Failed to delete session: {}", e)))?;
            Ok(deleted > 0)
        })
    }

    /// Count all sessions.
    pub fn count(&self) -> Result<u64, HearthError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM chat_sessions", [], |row| row.get(0))
                .map_err(|e| HearthError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    /// Count sessions created at or after the given instant.
    pub fn count_created_since(&self, since: DateTime<Utc>) -> Result<u64, HearthError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM chat_sessions WHERE created_at >= ?1",
                    rusqlite::params![since.timestamp_millis()],
                    |row| row.get(0),
                )
                .map_err(|e| HearthError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    /// Per-model session and message counts, most-used models first.
    pub fn model_usage(&self) -> Result<Vec<ModelUsageRow>, HearthError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT s.model, COUNT(DISTINCT s.id), COUNT(m.id)
                     FROM chat_sessions s
                     LEFT JOIN chat_messages m ON m.session_id = s.id
                     GROUP BY s.model
                     ORDER BY COUNT(DISTINCT s.id) DESC, s.model",
                )
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(ModelUsageRow {
                        model: row.get::<_, String>(0)?,
                        sessions: row.get::<_, i64>(1)? as u64,
                        messages: row.get::<_, i64>(2)? as u64,
                    })
                })
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let mut usage = Vec::new();
            for row in rows {
                usage.push(row.map_err(|e| HearthError::Storage(e.to_string()))?);
            }
            Ok(usage)
        })
    }
}

/// Repository for conversation turns.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new message row.
    pub fn insert(&self, message: &MessageRecord) -> Result<(), HearthError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages
                 (id, session_id, user_message, assistant_response, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    message.id.to_string(),
                    message.session_id.to_string(),
                    message.user_message,
                    message.assistant_response,
                    message.created_at.timestamp_millis(),
                    message.modified_at.timestamp_millis(),
                ],
            )
            .map_err(|e| HearthError::Storage(format!("Failed to insert message: {}", e)))?;
            Ok(())
        })
    }

    /// Find a message by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<MessageRecord>, HearthError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {} FROM chat_messages WHERE id = ?1",
                    MESSAGE_COLUMNS
                ))
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_message(row))
                })
                .optional()
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            match result {
                Some(message) => Ok(Some(message?)),
                None => Ok(None),
            }
        })
    }

    /// All messages for a session, oldest first.
    pub fn list_for_session(&self, session_id: Uuid) -> Result<Vec<MessageRecord>, HearthError> {
        self.query_messages(
            &format!(
                "SELECT {} FROM chat_messages WHERE session_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
                MESSAGE_COLUMNS
            ),
            rusqlite::params![session_id.to_string()],
        )
    }

    /// The most recent `limit` messages for a session, newest first.
    ///
    /// Callers that need chronological order reverse the result.
    pub fn recent_for_session(
        &self,
        session_id: Uuid,
        limit: u64,
    ) -> Result<Vec<MessageRecord>, HearthError> {
        self.query_messages(
            &format!(
                "SELECT {} FROM chat_messages WHERE session_id = ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
                MESSAGE_COLUMNS
            ),
            rusqlite::params![session_id.to_string(), limit],
        )
    }

    fn query_messages(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<MessageRecord>, HearthError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(sql)
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(params, |row| Ok(row_to_message(row)))
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| HearthError::Storage(e.to_string()))??;
                messages.push(message);
            }
            Ok(messages)
        })
    }

    /// Update whichever fields are provided and refresh modified_at.
    ///
    /// Returns false when the message does not exist. Passing neither field
    /// still refreshes nothing and reports row existence; callers are
    /// expected to validate before calling.
    pub fn update_fields(
        &self,
        id: Uuid,
        user_message: Option<&str>,
        assistant_response: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<bool, HearthError> {
        self.db.with_conn(|conn| {
            let changed = match (user_message, assistant_response) {
                (Some(user), Some(assistant)) => conn.execute(
                    "UPDATE chat_messages
                     SET user_message = ?1, assistant_response = ?2, modified_at = ?3
                     WHERE id = ?4",
                    rusqlite::params![user, assistant, now.timestamp_millis(), id.to_string()],
                ),
                (Some(user), None) => conn.execute(
                    "UPDATE chat_messages SET user_message = ?1, modified_at = ?2 WHERE id = ?3",
                    rusqlite::params![user, now.timestamp_millis(), id.to_string()],
                ),
                (None, Some(assistant)) => conn.execute(
                    "UPDATE chat_messages
                     SET assistant_response = ?1, modified_at = ?2
                     WHERE id = ?3",
                    rusqlite::params![assistant, now.timestamp_millis(), id.to_string()],
                ),
                (None, None) => Ok(0),
            }
            .map_err(|e| HearthError::Storage(format!("Failed to update message: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Count all messages.
    pub fn count(&self) -> Result<u64, HearthError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM chat_messages", [], |row| row.get(0))
                .map_err(|e| HearthError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }

    /// Count messages belonging to one session.
    pub fn count_for_session(&self, session_id: Uuid) -> Result<u64, HearthError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM chat_messages WHERE session_id = ?1",
                    rusqlite::params![session_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| HearthError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// A stored retrieval document with its decoded embedding.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: Uuid,
    pub content: String,
    /// JSON metadata attached at indexing time.
    pub metadata: serde_json::Value,
    pub embedding: Vec<f32>,
}

/// Repository for vector store documents.
pub struct DocumentRepository {
    db: Arc<Database>,
}

impl DocumentRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a document with its embedding.
    pub fn insert(
        &self,
        id: Uuid,
        content: &str,
        metadata: &serde_json::Value,
        embedding: &[f32],
        now: DateTime<Utc>,
    ) -> Result<(), HearthError> {
        let blob = embedding_to_bytes(embedding);
        let metadata_json = serde_json::to_string(metadata)?;
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO retrieval_documents (id, content, metadata, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id.to_string(), content, metadata_json, blob, now.timestamp_millis()],
            )
            .map_err(|e| HearthError::Storage(format!("Failed to insert document: {}", e)))?;
            Ok(())
        })
    }

    /// Load every stored document with its decoded embedding.
    pub fn all(&self) -> Result<Vec<DocumentRow>, HearthError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, content, metadata, embedding FROM retrieval_documents")
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map([], |row| {
                    let id: String = row.get(0)?;
                    let content: String = row.get(1)?;
                    let metadata: String = row.get(2)?;
                    let blob: Vec<u8> = row.get(3)?;
                    Ok((id, content, metadata, blob))
                })
                .map_err(|e| HearthError::Storage(e.to_string()))?;

            let mut docs = Vec::new();
            for row in rows {
                let (id, content, metadata, blob) =
                    row.map_err(|e| HearthError::Storage(e.to_string()))?;
                docs.push(DocumentRow {
                    id: Uuid::parse_str(&id)
                        .map_err(|e| HearthError::Storage(format!("Invalid document id: {}", e)))?,
                    content,
                    metadata: serde_json::from_str(&metadata).unwrap_or(serde_json::Value::Null),
                    embedding: bytes_to_embedding(&blob),
                });
            }
            Ok(docs)
        })
    }

    /// Count stored documents.
    pub fn count(&self) -> Result<u64, HearthError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM retrieval_documents", [], |row| {
                    row.get(0)
                })
                .map_err(|e| HearthError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Encode an embedding as little-endian f32 bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode little-endian f32 bytes back into an embedding.
fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
