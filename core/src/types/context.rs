use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::quality::{DataSample, QualityBand, QualityMetrics};
use crate::types::schema::DeviceSchema;

/// Everything the LLM needs to know about the data behind a query.
///
/// Built per request by the schema-aware context builder: the candidate
/// schemas, a bounded live sample per schema, quality metrics, and a
/// rendered summary. Maps are `BTreeMap` so rendering order is stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaAwareContext {
    pub query: String,
    pub schemas: Vec<DeviceSchema>,
    pub samples: BTreeMap<String, DataSample>,
    pub quality: BTreeMap<String, QualityMetrics>,
    /// Human-readable schema and sample summary for LLM consumption.
    pub schema_summary: String,
    /// Operational context lines pulled from the matched schemas.
    pub business_context: String,
    /// Band-driven recommendations, worst band first.
    pub recommendations: Vec<String>,
    pub built_at: DateTime<Utc>,
}

impl SchemaAwareContext {
    /// Total records the data source reported across all samples.
    pub fn total_records(&self) -> usize {
        self.samples.values().map(|s| s.total_count).sum()
    }

    /// The worst quality band across assessed schemas, `None` when nothing
    /// was assessed.
    pub fn worst_band(&self) -> Option<QualityBand> {
        self.quality
            .values()
            .map(|m| m.band())
            .max_by_key(|band| match band {
                QualityBand::Green => 0,
                QualityBand::Amber => 1,
                QualityBand::Red => 2,
            })
    }

    /// Whether any individual quality score dropped below the caveat
    /// threshold.
    pub fn has_low_quality_score(&self, threshold: f64) -> bool {
        self.quality.values().any(|m| {
            m.completeness < threshold
                || m.freshness < threshold
                || m.consistency < threshold
                || m.accuracy < threshold
        })
    }
}
