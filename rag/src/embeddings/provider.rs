//! Embedding provider trait and HTTP implementations.
//!
//! Supports OpenAI-compatible and Ollama embedding APIs. Both speak nearly
//! the same wire shape, so the main differences are authentication and the
//! response envelope.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RagError;

/// Default per-request deadline for embedding calls.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Trait for embedding providers that convert text to vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Generate embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;

    /// Dimensionality of embeddings produced.
    fn dimensions(&self) -> usize;

    /// Model identifier.
    fn model_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

fn http_client(timeout_secs: Option<u64>) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)))
        .build()
        .unwrap_or_default()
}

/// OpenAI-compatible embedding provider.
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    dims: usize,
}

impl OpenAiProvider {
    /// Create a new OpenAI-compatible provider.
    ///
    /// # Arguments
    /// * `api_key` - Bearer token
    /// * `model` - Model name (e.g. "text-embedding-3-small")
    /// * `endpoint` - API endpoint (defaults to "https://api.openai.com/v1")
    /// * `dims` - Embedding dimensions (defaults to 384)
    pub fn new(
        api_key: String,
        model: String,
        endpoint: Option<String>,
        dims: Option<usize>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            client: http_client(timeout_secs),
            endpoint: endpoint.unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            api_key,
            model,
            dims: dims.unwrap_or(384),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("empty response from embedding API".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/embeddings", self.endpoint);
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "embedding API error {status}: {body}"
            )));
        }

        let result: EmbeddingResponse = response.json().await?;
        Ok(result.data.into_iter().map(|d| d.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

/// Ollama embedding provider.
pub struct OllamaProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dims: usize,
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embeddings: Vec<Vec<f32>>,
}

impl OllamaProvider {
    /// Create a new Ollama provider.
    ///
    /// # Arguments
    /// * `model` - Model name (e.g. "all-minilm")
    /// * `endpoint` - Ollama endpoint (defaults to "http://localhost:11434")
    /// * `dims` - Embedding dimensions (defaults to 384)
    pub fn new(
        model: String,
        endpoint: Option<String>,
        dims: Option<usize>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            client: http_client(timeout_secs),
            endpoint: endpoint.unwrap_or_else(|| "http://localhost:11434".to_string()),
            model,
            dims: dims.unwrap_or(384),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let results = self.embed_batch(&[text.to_string()]).await?;
        results
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("empty response from Ollama".to_string()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let url = format!("{}/api/embed", self.endpoint);
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
        };

        let response = self.client.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!(
                "Ollama API error {status}: {body}"
            )));
        }

        let result: OllamaEmbeddingResponse = response.json().await?;
        Ok(result.embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_provider_defaults() {
        let provider = OpenAiProvider::new(
            "test-key".to_string(),
            "text-embedding-3-small".to_string(),
            None,
            None,
            None,
        );
        assert_eq!(provider.dimensions(), 384);
        assert_eq!(provider.model_name(), "text-embedding-3-small");
        assert_eq!(provider.endpoint, "https://api.openai.com/v1");
    }

    #[test]
    fn ollama_provider_custom_endpoint() {
        let provider = OllamaProvider::new(
            "all-minilm".to_string(),
            Some("http://embed-host:11434".to_string()),
            Some(512),
            Some(5),
        );
        assert_eq!(provider.dimensions(), 512);
        assert_eq!(provider.endpoint, "http://embed-host:11434");
    }
}
