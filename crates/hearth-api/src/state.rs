//! Application state shared across all route handlers.
//!
//! AppState holds references to all services and shared resources.
//! It is passed to handlers via axum's State extractor.

use std::sync::Arc;
use std::time::Instant;

use hearth_chat::ChatOrchestrator;
use hearth_core::config::HearthConfig;
use hearth_llm::{GenerationProvider, OllamaClient};
use hearth_retrieval::Retriever;
use hearth_storage::Database;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<HearthConfig>,
    /// SQLite database; handlers build repositories over it for read paths
    /// that bypass the orchestrator (stats, export).
    pub database: Arc<Database>,
    /// The conversation orchestrator.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Retrieval provider, surfaced for health reporting.
    pub retriever: Arc<dyn Retriever>,
    /// Model-management client for the local runtime.
    pub models: Arc<OllamaClient>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState, wiring the orchestrator from its parts.
    pub fn new(
        config: HearthConfig,
        database: Arc<Database>,
        retriever: Arc<dyn Retriever>,
        provider: Arc<dyn GenerationProvider>,
        models: OllamaClient,
    ) -> Self {
        let orchestrator = Arc::new(ChatOrchestrator::new(
            Arc::clone(&database),
            Arc::clone(&retriever),
            provider,
        ));
        Self {
            config: Arc::new(config),
            database,
            orchestrator,
            retriever,
            models: Arc::new(models),
            start_time: Instant::now(),
        }
    }
}
