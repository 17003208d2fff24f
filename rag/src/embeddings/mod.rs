//! Embedding generation for documents, health rules, and queries.
//!
//! The HTTP providers speak the OpenAI-compatible and Ollama embedding APIs.
//! When the model host is unreachable, callers fall back to the
//! deterministic hash embedder, which is reduced-quality but total.

mod fallback;
mod provider;

pub use fallback::{FallbackEmbedder, SemanticBoost};
pub use provider::{EmbeddingProvider, OllamaProvider, OpenAiProvider};
