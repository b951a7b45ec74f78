use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{HearthError, Result};

/// Top-level configuration for the Hearth application.
///
/// Loaded from `~/.hearth/config.toml` by default. Each section corresponds
/// to a bounded context or cross-cutting concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HearthConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl HearthConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: HearthConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| HearthError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.hearth/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind on 127.0.0.1.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8600 }
    }
}

/// Generation backend (Ollama-compatible runtime) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the local model runtime.
    pub base_url: String,
    /// Model used when a session is created without an explicit choice.
    pub default_model: String,
    /// HTTP client timeout in seconds. Generation on CPU can be slow.
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            default_model: "llama3".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Retrieval (context augmentation) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Whether to build the retriever at startup. When false the orchestrator
    /// runs every turn through the no-context branch.
    pub enabled: bool,
    /// Embedding dimensionality for the local vector store.
    pub dimensions: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dimensions: 384,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HearthConfig::default();
        assert_eq!(config.server.port, 8600);
        assert_eq!(config.llm.base_url, "http://localhost:11434");
        assert_eq!(config.llm.default_model, "llama3");
        assert!(config.retrieval.enabled);
        assert_eq!(config.retrieval.dimensions, 384);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let config = HearthConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.server.port, 8600);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = HearthConfig::default();
        config.server.port = 9100;
        config.llm.default_model = "codellama".to_string();
        config.save(&path).unwrap();

        let loaded = HearthConfig::load(&path).unwrap();
        assert_eq!(loaded.server.port, 9100);
        assert_eq!(loaded.llm.default_model, "codellama");
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nport = 9999\n").unwrap();

        let config = HearthConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 9999);
        // Untouched sections keep their defaults.
        assert_eq!(config.llm.timeout_secs, 300);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_load_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = [[[").unwrap();

        let result = HearthConfig::load(&path);
        assert!(matches!(result, Err(HearthError::Config(_))));
    }
}
