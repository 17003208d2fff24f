use netrag_core::NetragError;
use thiserror::Error;

/// Errors from schema validation, quality assessment, or rule evaluation.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("predicate parse error: {0}")]
    Predicate(String),

    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    #[error("record validation failed: {0}")]
    Validation(String),

    #[error("rule evaluation error: {0}")]
    Evaluation(String),
}

impl From<AnalysisError> for NetragError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::UnknownSchema(name) => NetragError::NotFound(format!("schema {name}")),
            AnalysisError::Validation(msg) => NetragError::Validation(msg),
            // Predicate and evaluation failures are bugs in the rule set.
            AnalysisError::Predicate(msg) | AnalysisError::Evaluation(msg) => {
                NetragError::Internal(msg)
            }
        }
    }
}
