//! # LLM Client
//!
//! Chat client for generating the final prose answer from assembled RAG
//! context. Supports OpenAI-compatible and Ollama endpoints. Requests are
//! gated by a semaphore so a burst of tool calls cannot overload the model
//! host, and every call carries a deadline.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;

use netrag_core::NetragError;

use crate::config::LlmConfig;

/// Errors from LLM operations.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key not found; set the {env_var} environment variable")]
    MissingApiKey { env_var: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse model response: {0}")]
    Parse(String),

    #[error("model call exceeded its deadline")]
    DeadlineExceeded,

    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
}

impl From<LlmError> for NetragError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::DeadlineExceeded => NetragError::Timeout("calling the LLM".to_string()),
            other => NetragError::upstream("llm", other.to_string()),
        }
    }
}

/// An ordered, role-tagged message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat client contract. The core sets the system content itself; callers
/// cannot override it.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
        deadline: Duration,
    ) -> Result<String, LlmError>;
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

/// HTTP chat client for OpenAI-compatible and Ollama endpoints.
#[derive(Debug)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    provider: String,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    semaphore: Arc<Semaphore>,
}

impl HttpLlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.provider == "openai" && config.api_key().is_none() {
            return Err(LlmError::MissingApiKey {
                env_var: config
                    .api_key_env
                    .clone()
                    .unwrap_or_else(|| "OPENAI_API_KEY".to_string()),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            provider: config.provider.clone(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key(),
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
        })
    }

    async fn call_openai(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let mut wire_messages = vec![ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        }];
        wire_messages.extend(messages.iter().cloned());

        let request = OpenAiRequest {
            model: self.model.clone(),
            messages: wire_messages,
            max_tokens,
            temperature,
            stream: false,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("no completion content".to_string()))
    }

    async fn call_ollama(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);
        let mut wire_messages = vec![ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        }];
        wire_messages.extend(messages.iter().cloned());

        let request = OllamaRequest {
            model: self.model.clone(),
            messages: wire_messages,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        Ok(parsed.message.content)
    }
}

#[async_trait]
impl ChatClient for HttpLlmClient {
    async fn chat(
        &self,
        system: &str,
        messages: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
        deadline: Duration,
    ) -> Result<String, LlmError> {
        // Queued requests wait here and still respect the deadline: the
        // timeout covers both the wait and the call.
        let work = async {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|_| LlmError::Network("llm gate closed".to_string()))?;
            match self.provider.as_str() {
                "openai" => {
                    self.call_openai(system, messages, max_tokens, temperature)
                        .await
                }
                "ollama" => self.call_ollama(system, messages).await,
                other => Err(LlmError::UnsupportedProvider(other.to_string())),
            }
        };

        match tokio::time::timeout(deadline, work).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openai_requires_api_key() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key_env: Some("NETRAG_TEST_MISSING_KEY".to_string()),
            ..LlmConfig::default()
        };
        let err = HttpLlmClient::new(&config).unwrap_err();
        assert!(matches!(err, LlmError::MissingApiKey { .. }));
    }

    #[test]
    fn ollama_needs_no_key() {
        let config = LlmConfig::default();
        assert!(HttpLlmClient::new(&config).is_ok());
    }

    #[tokio::test]
    async fn unsupported_provider_is_reported() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..LlmConfig::default()
        };
        let client = HttpLlmClient::new(&config).unwrap();
        let err = client
            .chat("sys", &[ChatMessage::user("hi")], 16, 0.0, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::UnsupportedProvider(_)));
    }

    #[tokio::test]
    async fn deadline_cuts_off_unreachable_host() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            // Reserved TEST-NET address; connections hang or fail.
            endpoint: "http://192.0.2.1:9".to_string(),
            ..LlmConfig::default()
        };
        let client = HttpLlmClient::new(&config).unwrap();
        let err = client
            .chat("sys", &[ChatMessage::user("hi")], 16, 0.0, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LlmError::DeadlineExceeded | LlmError::Network(_)
        ));
    }
}
