//! # netrag-analysis
//!
//! Deterministic analysis for netrag: the schema registry, the data-quality
//! assessor, and the health rule engine.
//!
//! Everything in this crate is synchronous and CPU-only except rule
//! selection, which consults the vector store. Rule evaluation itself has no
//! yield points, so it is trivially cancelable from the orchestrator.

pub mod error;
pub mod health;
pub mod quality;
pub mod registry;

pub use error::AnalysisError;
pub use health::{EnvironmentOverride, HealthRuleEngine};
pub use quality::{DataQualityAssessor, QualityConfig};
pub use registry::SchemaRegistry;
