//! Concrete embedding backends and provider selection.
//!
//! - **`hash`**: [`HashEmbedder`] from the core crate, computed locally without network access.
//! - **`openai`**: [`OpenAiEmbedder`] against `https://api.openai.com/v1/embeddings`.
//! - **`azure`**: [`OpenAiEmbedder`] against an Azure OpenAI deployment.
//! - **`disabled`**: [`DisabledEmbedder`]; every call fails.
//!
//! # Retry Strategy
//!
//! Remote providers retry transient failures with exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use tracing::warn;

use vectordocs_core::embedding::{Embedder, HashEmbedder};

use crate::config::EmbeddingConfig;

/// Always fails. Used when `embedding.provider = "disabled"`.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }
    fn dims(&self) -> usize {
        0
    }
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        bail!("Embedding provider is disabled")
    }
}

/// Where an [`OpenAiEmbedder`] sends its requests.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Flavor {
    OpenAi,
    Azure { endpoint: String, api_version: String },
}

/// Embedding backend speaking the OpenAI embeddings API, directly or
/// through an Azure OpenAI deployment.
pub struct OpenAiEmbedder {
    model: String,
    dims: usize,
    api_key: String,
    flavor: Flavor,
    max_retries: u32,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    /// Create an embedder from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` is not set, the Azure endpoint is missing,
    /// or the environment variable named by `api_key_env` is not set.
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow!("embedding.model required for {} provider", config.provider))?;

        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", config.api_key_env))?;

        let flavor = match config.provider.as_str() {
            "azure" => Flavor::Azure {
                endpoint: config
                    .endpoint
                    .clone()
                    .ok_or_else(|| anyhow!("embedding.endpoint required for azure provider"))?
                    .trim_end_matches('/')
                    .to_string(),
                api_version: config.api_version.clone(),
            },
            _ => Flavor::OpenAi,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            dims: config.dims,
            api_key,
            flavor,
            max_retries: config.max_retries,
            client,
        })
    }

    fn url(&self) -> String {
        match &self.flavor {
            Flavor::OpenAi => "https://api.openai.com/v1/embeddings".to_string(),
            Flavor::Azure {
                endpoint,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/embeddings?api-version={}",
                endpoint, self.model, api_version
            ),
        }
    }

    fn request(&self, body: &serde_json::Value) -> reqwest::RequestBuilder {
        let builder = self.client.post(self.url()).json(body);
        match self.flavor {
            Flavor::OpenAi => builder.bearer_auth(&self.api_key),
            Flavor::Azure { .. } => builder.header("api-key", &self.api_key),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = serde_json::json!({
            "model": self.model,
            "input": [text],
            "dimensions": self.dims,
        });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            match self.request(&body).send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return first_embedding(&json);
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!(%status, attempt, "embedding request failed, retrying");
                        last_err = Some(anyhow!("embedding API error {}: {}", status, body_text));
                        continue;
                    }

                    bail!("embedding API error {}: {}", status, body_text);
                }
                Err(e) => {
                    warn!(error = %e, attempt, "embedding request failed, retrying");
                    last_err = Some(e.into());
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Embedding failed after retries")))
    }
}

/// Extract `data[0].embedding` from an embeddings API response.
fn first_embedding(json: &serde_json::Value) -> Result<Vec<f32>> {
    let embedding = json
        .get("data")
        .and_then(|d| d.as_array())
        .and_then(|d| d.first())
        .and_then(|item| item.get("embedding"))
        .and_then(|e| e.as_array())
        .ok_or_else(|| anyhow!("Invalid embeddings response: missing data[0].embedding"))?;

    embedding
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| anyhow!("Invalid embeddings response: non-numeric component"))
        })
        .collect()
}

/// Create the [`Embedder`] selected by `embedding.provider`.
///
/// | Config Value | Embedder |
/// |-------------|----------|
/// | `"hash"` | [`HashEmbedder`] |
/// | `"openai"` / `"azure"` | [`OpenAiEmbedder`] |
/// | `"disabled"` | [`DisabledEmbedder`] |
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider.as_str() {
        "hash" => Ok(Arc::new(HashEmbedder::new(config.dims))),
        "openai" | "azure" => Ok(Arc::new(OpenAiEmbedder::new(config)?)),
        "disabled" => Ok(Arc::new(DisabledEmbedder)),
        other => bail!("Unknown embedding provider: {}", other),
    }
}
