use thiserror::Error;

/// Error taxonomy shared by every netrag crate.
///
/// The orchestrator pattern-matches on these variants to decide degradation;
/// the tool surface maps them to the out-of-band error channel via
/// [`NetragError::kind`].
#[derive(Error, Debug)]
pub enum NetragError {
    /// Malformed query or arguments, unknown enum values.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No such document, device, or schema.
    #[error("not found: {0}")]
    NotFound(String),

    /// Document rejected for length or shape.
    #[error("validation failed: {0}")]
    Validation(String),

    /// LLM, embedder, vector store, or data source unreachable.
    #[error("{component} unavailable: {message}")]
    UpstreamUnavailable { component: String, message: String },

    /// A per-call or overall deadline was hit.
    #[error("deadline exceeded while {0}")]
    Timeout(String),

    /// The caller canceled the request. Never carries a partial answer.
    #[error("request canceled")]
    Canceled,

    /// Persisted state written by a newer version of the code.
    #[error("incompatible state: snapshot schema_version {found} exceeds supported {supported}")]
    IncompatibleState { found: u32, supported: u32 },

    /// A bug. Rule-evaluation failures land here and are contained per device.
    #[error("internal error: {0}")]
    Internal(String),
}

impl NetragError {
    /// Helper for upstream failures that keeps the component name attached.
    pub fn upstream(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Stable error-kind label for the tool surface's error channel.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) | Self::Validation(_) => "INVALID_ARGUMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::UpstreamUnavailable { .. } => "UPSTREAM_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::Canceled => "CANCELED",
            Self::IncompatibleState { .. } => "INCOMPATIBLE_STATE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(NetragError::InvalidInput("x".into()).kind(), "INVALID_ARGUMENT");
        assert_eq!(NetragError::Validation("x".into()).kind(), "INVALID_ARGUMENT");
        assert_eq!(NetragError::NotFound("x".into()).kind(), "NOT_FOUND");
        assert_eq!(NetragError::upstream("llm", "down").kind(), "UPSTREAM_UNAVAILABLE");
        assert_eq!(NetragError::Canceled.kind(), "CANCELED");
    }

    #[test]
    fn upstream_display_names_component() {
        let err = NetragError::upstream("vector store", "connection refused");
        assert!(err.to_string().contains("vector store"));
        assert!(err.to_string().contains("connection refused"));
    }
}
