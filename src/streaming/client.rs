//! Ollama generation client
//!
//! Streams completions from `POST /api/generate` as newline-delimited JSON.

use crate::errors::{RagError, Result};
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::response::ResponseStream;

/// Default Ollama host
pub const DEFAULT_OLLAMA_HOST: &str = "127.0.0.1";

/// Default Ollama port
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

/// Default generation model
pub const DEFAULT_MODEL: &str = "gemma3";

/// Connect timeout; streamed generations may run for minutes
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Ollama streaming client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    /// Create new Ollama client with default settings
    pub fn new() -> Result<Self> {
        let base_url = format!("http://{}:{}", DEFAULT_OLLAMA_HOST, DEFAULT_OLLAMA_PORT);
        Self::with_config(&base_url, DEFAULT_MODEL)
    }

    /// Create Ollama client with custom configuration
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    /// Start a streamed generation for `prompt`
    ///
    /// Fails when the server is unreachable or answers with a non-success
    /// status. Errors after that point surface through the returned stream.
    pub async fn generate_stream(&self, prompt: String) -> Result<ResponseStream> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: true,
        };

        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "requesting generation");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RagError::GenerationService(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(%status, "generation request rejected");
            return Err(RagError::GenerationService(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response
            .bytes_stream()
            .map(|result| {
                result.map_err(|e| RagError::GenerationService(format!("stream interrupted: {}", e)))
            })
            .boxed();

        Ok(ResponseStream::new(body))
    }

    /// True when the server answers `/api/version`
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "ollama unreachable");
                false
            }
        }
    }

    /// Names of the models pulled on the server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RagError::GenerationService(format!("Failed to list models: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::GenerationService(
                "Failed to retrieve model list".to_string(),
            ));
        }

        let models_response: ModelsResponse = response
            .json()
            .await
            .map_err(|e| RagError::GenerationService(format!("Failed to parse models: {}", e)))?;

        Ok(models_response
            .models
            .into_iter()
            .map(|m| m.name)
            .collect())
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}
