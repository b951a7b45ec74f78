//! Hearth storage crate - SQLite persistence for sessions, messages, and
//! retrieval documents.
//!
//! Provides a WAL-mode SQLite database with migrations and repository
//! implementations for chat_sessions, chat_messages, and retrieval_documents.

pub mod db;
pub mod migrations;
pub mod repository;

pub use db::Database;
pub use repository::{
    DocumentRepository, DocumentRow, MessageRepository, ModelUsageRow, SessionRepository,
};
