use netrag_core::NetragError;
use thiserror::Error;

/// Errors that can occur during retrieval operations.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding provider error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Store(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("document validation error: {0}")]
    Validation(String),

    #[error("document not found: {0}")]
    NotFound(String),

    #[error("snapshot schema_version {found} exceeds supported {supported}")]
    IncompatibleSnapshot { found: u32, supported: u32 },
}

impl From<RagError> for NetragError {
    fn from(e: RagError) -> Self {
        match e {
            RagError::Embedding(msg) => NetragError::upstream("embedding provider", msg),
            RagError::Store(msg) => NetragError::upstream("vector store", msg),
            RagError::Http(e) => NetragError::upstream("http", e.to_string()),
            RagError::Serialization(e) => NetragError::Internal(e.to_string()),
            RagError::Validation(msg) => NetragError::Validation(msg),
            RagError::NotFound(msg) => NetragError::NotFound(msg),
            RagError::IncompatibleSnapshot { found, supported } => {
                NetragError::IncompatibleState { found, supported }
            }
        }
    }
}
