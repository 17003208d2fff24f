pub mod context;
pub mod device;
pub mod document;
pub mod guidance;
pub mod health;
pub mod quality;
pub mod schema;

pub use context::SchemaAwareContext;
pub use device::DeviceRecord;
pub use document::{Document, DocumentKind, ScoredDocument};
pub use guidance::{AnalysisType, Confidence, Guidance, ToolName};
pub use health::{
    CompareOp, FiredAdjustment, HealthReport, HealthRule, HealthStatus, Priority, Recommendation,
    RecommendationRule, RuleCondition, ScoreAdjustment,
};
pub use quality::{DataSample, QualityBand, QualityMetrics};
pub use schema::{DeviceSchema, FieldSpec, FieldType};
