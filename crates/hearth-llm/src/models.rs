//! Model-management client for the local runtime.
//!
//! Thin proxy over the runtime's HTTP API: installed models, model details,
//! removal, running models, pull, and a version probe. These calls are
//! transport glue with no orchestration state; errors map onto `LlmError`
//! and are surfaced to the HTTP layer as-is.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use hearth_core::error::HearthError;

use crate::error::LlmError;

/// One locally installed model, as reported by the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalModel {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub modified_at: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

/// Final status of a pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullStatus {
    #[serde(default)]
    pub status: String,
}

/// HTTP client for the runtime's model-management endpoints.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
    pull_client: Client,
}

impl OllamaClient {
    /// Create a client for the runtime at `base_url`.
    ///
    /// Pull requests get their own client with no timeout: downloading a
    /// multi-gigabyte model can take arbitrarily long.
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, HearthError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| HearthError::Config(format!("Failed to build HTTP client: {}", e)))?;
        let pull_client = Client::builder()
            .build()
            .map_err(|e| HearthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            pull_client,
        })
    }

    /// List models installed on the runtime (GET /api/tags).
    pub async fn list_local(&self) -> Result<Vec<LocalModel>, LlmError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        let response = check_status(response).await?;
        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("unparseable tags response: {}", e)))?;
        Ok(tags.models)
    }

    /// Detailed information about one model (POST /api/show).
    pub async fn show(&self, model: &str) -> Result<serde_json::Value, LlmError> {
        let url = format!("{}/api/show", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "model": model }))
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("unparseable show response: {}", e)))
    }

    /// Remove an installed model (DELETE /api/delete).
    pub async fn remove(&self, model: &str) -> Result<(), LlmError> {
        let url = format!("{}/api/delete", self.base_url);
        let response = self
            .client
            .delete(&url)
            .json(&serde_json::json!({ "name": model }))
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        check_status(response).await?;
        info!(model, "Model removed");
        Ok(())
    }

    /// Models currently loaded into memory (GET /api/ps).
    pub async fn running(&self) -> Result<serde_json::Value, LlmError> {
        let url = format!("{}/api/ps", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("unparseable ps response: {}", e)))
    }

    /// Download a model (POST /api/pull, stream disabled).
    ///
    /// Blocks until the runtime finishes the download and reports the final
    /// status only.
    pub async fn pull(&self, model: &str) -> Result<PullStatus, LlmError> {
        let url = format!("{}/api/pull", self.base_url);
        info!(model, "Pulling model");
        let response = self
            .pull_client
            .post(&url)
            .json(&serde_json::json!({ "name": model, "stream": false }))
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("unparseable pull response: {}", e)))
    }

    /// Probe the runtime's version (GET /api/version). Doubles as a health
    /// check for whether the runtime is reachable at all.
    pub async fn version(&self) -> Result<String, LlmError> {
        let url = format!("{}/api/version", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LlmError::from_transport(&self.base_url, e))?;

        let response = check_status(response).await?;
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Protocol(format!("unparseable version response: {}", e)))?;
        body.get("version")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| LlmError::Protocol("missing 'version'".to_string()))
    }
}

/// Turn a non-success HTTP status into an `Upstream` error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let message = response.text().await.unwrap_or_default();
        Err(LlmError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn make_client(server: &MockServer) -> OllamaClient {
        OllamaClient::new(server.uri(), 10).unwrap()
    }

    #[tokio::test]
    async fn test_list_local() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [
                    {"name": "llama3:latest", "size": 4_700_000_000_u64, "digest": "abc123"},
                    {"name": "codellama:latest"}
                ]
            })))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let models = client.list_local().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "llama3:latest");
        assert_eq!(models[0].size, Some(4_700_000_000));
        assert!(models[1].size.is_none());
    }

    #[tokio::test]
    async fn test_list_local_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        assert!(client.list_local().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_show() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/show"))
            .and(body_partial_json(json!({"model": "llama3"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"details": {"family": "llama"}})),
            )
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let info = client.show("llama3").await.unwrap();
        assert_eq!(info["details"]["family"], "llama");
    }

    #[tokio::test]
    async fn test_remove_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/delete"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let err = client.remove("ghost-model").await.unwrap_err();
        assert!(matches!(err, LlmError::Upstream { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_pull_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .and(body_partial_json(json!({"name": "llama3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        let status = client.pull("llama3").await.unwrap();
        assert_eq!(status.status, "success");
    }

    #[tokio::test]
    async fn test_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "0.5.1"})))
            .mount(&server)
            .await;

        let client = make_client(&server).await;
        assert_eq!(client.version().await.unwrap(), "0.5.1");
    }

    #[tokio::test]
    async fn test_version_unreachable() {
        let client = OllamaClient::new("http://127.0.0.1:1", 2).unwrap();
        let err = client.version().await.unwrap_err();
        assert!(matches!(err, LlmError::Unavailable(_) | LlmError::Timeout));
    }
}
