//! # Configuration Management
//!
//! Startup configuration for netrag: embedding dimension and provider, the
//! LLM endpoint, request timeouts, result limits, quality thresholds, and
//! the semantic-boost table for the fallback embedder.
//!
//! Configuration is read once from an optional JSON file; every field has
//! a default so the system runs with no file at all.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use netrag_rag::embeddings::SemanticBoost;

/// LLM provider configuration.
///
/// # Supported Providers
///
/// - `openai`: any OpenAI-compatible chat completions endpoint
/// - `ollama`: local Ollama instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider (openai, ollama).
    pub provider: String,
    /// API endpoint URL.
    pub endpoint: String,
    /// Model name.
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    /// Completion token budget per request.
    pub max_tokens: u32,
    pub temperature: f32,
    /// Request deadline in seconds.
    pub timeout_secs: u64,
    /// Concurrent in-flight requests allowed to the model host.
    pub concurrency: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.1".to_string(),
            api_key_env: None,
            max_tokens: 2048,
            temperature: 0.2,
            timeout_secs: 120,
            concurrency: 4,
        }
    }
}

impl LlmConfig {
    /// Get the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_env
            .as_ref()
            .and_then(|var| std::env::var(var).ok())
    }
}

/// Embedding provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider (fallback, openai, ollama). `fallback` uses the
    /// deterministic hash embedder with no network dependency.
    pub provider: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub model: String,
    /// Vector dimension D.
    pub dims: usize,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "fallback".to_string(),
            endpoint: None,
            model: "all-minilm".to_string(),
            dims: 384,
            timeout_secs: 10,
            api_key_env: None,
        }
    }
}

/// Quality assessment thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub sample_cap: usize,
    pub fresh_window_mins: i64,
    pub decay_horizon_hours: i64,
    /// Any component score below this adds a caveat to responses.
    pub low_score_threshold: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            sample_cap: 200,
            fresh_window_mins: 15,
            decay_horizon_hours: 24,
            low_score_threshold: 0.5,
        }
    }
}

/// Document search thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub min_similarity: f32,
    pub min_usefulness: f64,
    pub recency_window_days: i64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            min_similarity: 0.5,
            min_usefulness: 0.3,
            recency_window_days: 90,
        }
    }
}

/// Result limits and per-call deadlines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Default device list size.
    pub device_limit: usize,
    /// Records sampled per schema for the context builder.
    pub sample_size: usize,
    /// Upper bound on assembled LLM context, in characters.
    pub max_context_chars: usize,
    pub overall_timeout_secs: u64,
    pub data_fetch_timeout_secs: u64,
    pub document_fetch_timeout_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            device_limit: 50,
            sample_size: 20,
            max_context_chars: 16_000,
            overall_timeout_secs: 150,
            data_fetch_timeout_secs: 10,
            document_fetch_timeout_secs: 5,
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub quality: QualitySettings,
    pub search: SearchSettings,
    pub limits: Limits,
    /// Boost table for the fallback embedder. Empty means use the built-in
    /// defaults.
    pub semantic_boosts: Vec<SemanticBoost>,
    /// JSON file with device records for the static data source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
    /// JSON snapshot of the vector store, loaded at startup when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from a JSON file, or defaults when `path` is
    /// `None`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            None => Ok(Self::default()),
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing config file {}", path.display()))
            }
        }
    }

    /// The boost table to install in the fallback embedder.
    pub fn boosts(&self) -> Vec<SemanticBoost> {
        if self.semantic_boosts.is_empty() {
            netrag_rag::embeddings::FallbackEmbedder::default_boosts()
        } else {
            self.semantic_boosts.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.embedding.dims, 384);
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.llm.timeout_secs, 120);
        assert_eq!(config.llm.concurrency, 4);
        assert_eq!(config.limits.device_limit, 50);
        assert_eq!(config.limits.max_context_chars, 16_000);
        assert_eq!(config.limits.overall_timeout_secs, 150);
        assert_eq!(config.search.min_similarity, 0.5);
        assert_eq!(config.quality.low_score_threshold, 0.5);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"llm": {"model": "mistral"}, "limits": {"device_limit": 10}}"#)
            .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.limits.device_limit, 10);
        // Untouched fields keep their defaults.
        assert_eq!(config.llm.max_tokens, 2048);
        assert_eq!(config.embedding.dims, 384);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(AppConfig::load(Some(Path::new("/nonexistent/config.json"))).is_err());
    }
}
