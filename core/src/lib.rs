//! # netrag-core
//!
//! Domain types for netrag, the network fleet RAG service.
//!
//! This crate defines the records that flow between the retrieval layer,
//! the analysis layer, and the query orchestrator:
//!
//! - **Documents**: operational knowledge-base entries with embeddings metadata
//! - **Devices**: schema-tagged records fetched from the network data source
//! - **Schemas**: declarative shapes for device records plus intent keywords
//! - **Health**: declarative health rules and the reports they produce
//! - **Quality**: data-quality metrics and live data samples
//! - **Guidance**: the RAG fusion analyzer's structured recommendation
//!
//! All types are plain serde-serializable data; behavior lives in the
//! `netrag-rag` and `netrag-analysis` crates.

pub mod error;
pub mod types;

pub use error::NetragError;
pub use types::context::SchemaAwareContext;
pub use types::device::DeviceRecord;
pub use types::document::{Document, DocumentKind, ScoredDocument};
pub use types::guidance::{AnalysisType, Confidence, Guidance, ToolName};
pub use types::health::{
    CompareOp, FiredAdjustment, HealthReport, HealthRule, HealthStatus, Priority, Recommendation,
    RecommendationRule, RuleCondition, ScoreAdjustment,
};
pub use types::quality::{DataSample, QualityBand, QualityMetrics};
pub use types::schema::{DeviceSchema, FieldSpec, FieldType};
