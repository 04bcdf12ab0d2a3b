//! TOML configuration.
//!
//! Every section and field has a default, so an empty file (or no file at
//! the default path) is a valid configuration using the local `hash`
//! embedder. API keys are never read from the file; `api_key_env` names the
//! environment variable that holds them.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use vectordocs_core::chunk::DEFAULT_STRUCTURED_EXTENSIONS;
use vectordocs_core::ingest::DEFAULT_PROGRESS_EVERY;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_dims")]
    pub dims: usize,
    /// Azure OpenAI resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: default_dims(),
            endpoint: None,
            api_version: default_api_version(),
            api_key_env: default_api_key_env(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "hash".to_string()
}
fn default_dims() -> usize {
    3072
}
fn default_api_version() -> String {
    "2024-02-01".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Comma-separated file name suffixes.
    #[serde(default = "default_extensions")]
    pub extensions: String,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_structured_extensions")]
    pub structured_extensions: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default = "default_progress_every")]
    pub progress_every: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            collection: default_collection(),
            structured_extensions: default_structured_extensions(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            progress_every: default_progress_every(),
        }
    }
}

fn default_extensions() -> String {
    ".cs".to_string()
}
fn default_collection() -> String {
    "code_documentation".to_string()
}
fn default_structured_extensions() -> Vec<String> {
    DEFAULT_STRUCTURED_EXTENSIONS
        .iter()
        .map(|e| e.to_string())
        .collect()
}
fn default_progress_every() -> usize {
    DEFAULT_PROGRESS_EVERY
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    5
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Parse and validate a configuration document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

/// Read, parse, and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Invalid config file: {}", path.display()))
}

/// Load `path` if it exists; otherwise fall back to defaults when
/// `allow_missing` is set.
pub fn load_or_default(path: &Path, allow_missing: bool) -> Result<Config> {
    if allow_missing && !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }
    load_config(path)
}

fn validate(config: &Config) -> Result<()> {
    if config.embedding.dims == 0 {
        bail!("embedding.dims must be > 0");
    }

    match config.embedding.provider.as_str() {
        "disabled" | "hash" => {}
        "openai" | "azure" => {
            if config.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    config.embedding.provider
                );
            }
            if config.embedding.provider == "azure" && config.embedding.endpoint.is_none() {
                bail!("embedding.endpoint must be specified when provider is 'azure'");
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be hash, openai, azure, or disabled.",
            other
        ),
    }

    if config.ingest.progress_every == 0 {
        bail!("ingest.progress_every must be > 0");
    }
    if config.ingest.collection.trim().is_empty() {
        bail!("ingest.collection must not be empty");
    }

    if config.search.limit < 1 {
        bail!("search.limit must be >= 1");
    }

    Ok(())
}
