//! Hearth application binary - composition root.
//!
//! Ties together all Hearth crates into a single executable:
//! 1. Load configuration from TOML
//! 2. Open storage (SQLite, WAL mode, migrations)
//! 3. Build the retriever (vector store over the same database)
//! 4. Wire the generation provider and model-management client
//! 5. Start the axum REST API server on localhost

use std::path::PathBuf;
use std::sync::Arc;

use hearth_api::{routes, state::AppState};
use hearth_core::config::HearthConfig;
use hearth_llm::{OllamaClient, OllamaProvider};
use hearth_retrieval::{HashEmbedding, Retriever, VectorRetriever};
use hearth_storage::Database;

/// Expand ~ to home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

/// Resolve the config file path (HEARTH_CONFIG env, or ~/.hearth/config.toml).
fn config_path() -> PathBuf {
    if let Ok(p) = std::env::var("HEARTH_CONFIG") {
        return PathBuf::from(p);
    }
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".hearth").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".hearth").join("config.toml");
    }
    PathBuf::from("config.toml")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Hearth v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = config_path();
    let config = HearthConfig::load_or_default(&config_file);
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("hearth.db");
    let db = Arc::new(Database::new(&db_path)?);
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Retriever (single shared instance, constructed once).
    let embedder = HashEmbedding::new(config.retrieval.dimensions);
    let retriever: Arc<dyn Retriever> = if config.retrieval.enabled {
        Arc::new(VectorRetriever::new(Arc::clone(&db), embedder))
    } else {
        tracing::info!("Retrieval disabled in config; turns run without context");
        Arc::new(VectorRetriever::disabled(Arc::clone(&db), embedder))
    };
    if config.retrieval.enabled && !retriever.is_initialized() {
        tracing::warn!("Retriever failed to initialize; turns will run without context");
    }

    // Generation provider and model-management client.
    let provider = Arc::new(OllamaProvider::new(
        config.llm.base_url.clone(),
        config.llm.timeout_secs,
    )?);
    let models = OllamaClient::new(config.llm.base_url.clone(), config.llm.timeout_secs)?;

    match models.version().await {
        Ok(version) => tracing::info!(version = %version, "Model runtime reachable"),
        Err(e) => tracing::warn!(error = %e, "Model runtime not reachable; chat turns will fail until it is up"),
    }

    // === API server ===

    let state = AppState::new(config, db, retriever, provider, models);
    routes::start_server(state).await?;

    Ok(())
}
