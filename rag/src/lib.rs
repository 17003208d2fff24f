//! # netrag-rag
//!
//! Knowledge retrieval for netrag: embeddings, vector search, the document
//! store, and the RAG fusion analyzer.
//!
//! # Architecture
//!
//! The retrieval system has three layers:
//!
//! 1. **Embeddings** - An [`embeddings::EmbeddingProvider`] turns text into
//!    fixed-dimension vectors. HTTP providers call OpenAI-compatible or
//!    Ollama endpoints; the deterministic [`embeddings::FallbackEmbedder`]
//!    is total and keeps the system answering when the model host is down.
//!
//! 2. **Stores** - The [`store::VectorStore`] holds vectors in memory with
//!    brute-force cosine search and JSON snapshots; the
//!    [`documents::DocumentStore`] owns the documents themselves and ranks
//!    hits by business value.
//!
//! 3. **Fusion analysis** - The [`fusion::RagFusionAnalyzer`] rephrases a
//!    query along several strategies, retrieves supporting documents, and
//!    scores deterministic pattern tallies into tool and analysis-type
//!    guidance.

pub mod documents;
pub mod embeddings;
pub mod error;
pub mod fusion;
pub mod keywords;
pub mod store;

pub use documents::{DocumentStore, DraftDocument};
pub use embeddings::{EmbeddingProvider, FallbackEmbedder};
pub use error::RagError;
pub use fusion::RagFusionAnalyzer;
pub use store::{RecordKind, SearchHit, VectorMeta, VectorStore};
