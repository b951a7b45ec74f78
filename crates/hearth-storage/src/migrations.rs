//! Database schema migrations.
//!
//! Applies the initial schema: chat_sessions, chat_messages (cascade delete),
//! retrieval_documents, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use hearth_core::error::HearthError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental changes.
pub fn run_migrations(conn: &Connection) -> Result<(), HearthError> {
    // Create the migrations tracking table first.
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| HearthError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| HearthError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), HearthError> {
    conn.execute_batch(
        "
        -- Chat sessions. Title starts as the 'New Chat' sentinel and is
        -- claimed by the first completed turn.
        CREATE TABLE IF NOT EXISTS chat_sessions (
            id          TEXT PRIMARY KEY NOT NULL,
            title       TEXT NOT NULL DEFAULT 'New Chat',
            model       TEXT NOT NULL,
            created_at  INTEGER NOT NULL,
            modified_at INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_created
            ON chat_sessions (created_at DESC);

        CREATE INDEX IF NOT EXISTS idx_sessions_model
            ON chat_sessions (model, created_at DESC);

        -- Conversation turns. assistant_response is nullable: a turn may
        -- exist with a pending or absent response.
        CREATE TABLE IF NOT EXISTS chat_messages (
            id                 TEXT PRIMARY KEY NOT NULL,
            session_id         TEXT NOT NULL,
            user_message       TEXT NOT NULL,
            assistant_response TEXT,
            created_at         INTEGER NOT NULL,
            modified_at        INTEGER NOT NULL,
            FOREIGN KEY (session_id) REFERENCES chat_sessions(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_session
            ON chat_messages (session_id, created_at ASC);

        -- Vector store documents for context retrieval. Embeddings are
        -- little-endian f32 blobs.
        CREATE TABLE IF NOT EXISTS retrieval_documents (
            id          TEXT PRIMARY KEY NOT NULL,
            content     TEXT NOT NULL,
            metadata    TEXT NOT NULL DEFAULT '{}',
            embedding   BLOB NOT NULL,
            created_at  INTEGER NOT NULL
        );

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| HearthError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
