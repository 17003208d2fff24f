//! Schema-aware context builder.
//!
//! Combines candidate schemas, bounded live samples, and quality metrics
//! into the [`SchemaAwareContext`] handed to the LLM alongside the
//! question. Fetch failures degrade to empty samples, which score red and
//! surface a data-refresh recommendation instead of aborting the request.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::Map;

use netrag_analysis::{DataQualityAssessor, SchemaRegistry};
use netrag_core::{DataSample, QualityBand, SchemaAwareContext};

use crate::source::DataSource;

pub struct ContextBuilder {
    registry: Arc<SchemaRegistry>,
    assessor: DataQualityAssessor,
    source: Arc<dyn DataSource>,
    sample_size: usize,
    fetch_timeout: Duration,
}

impl ContextBuilder {
    pub fn new(
        registry: Arc<SchemaRegistry>,
        assessor: DataQualityAssessor,
        source: Arc<dyn DataSource>,
        sample_size: usize,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            assessor,
            source,
            sample_size,
            fetch_timeout,
        }
    }

    /// Build the context for a query. Total: every failure mode produces a
    /// context, possibly with empty red-banded samples.
    pub async fn build(&self, query: &str) -> SchemaAwareContext {
        let now = Utc::now();
        let schemas: Vec<netrag_core::DeviceSchema> = self
            .registry
            .schemas_for_query(query)
            .into_iter()
            .cloned()
            .collect();

        let mut samples = BTreeMap::new();
        let mut quality = BTreeMap::new();

        for schema in &schemas {
            let fetched = tokio::time::timeout(
                self.fetch_timeout,
                self.source.fetch(&schema.name, &Map::new(), self.sample_size),
            )
            .await;

            let sample = match fetched {
                Ok(Ok(records)) => DataSample {
                    schema_name: schema.name.clone(),
                    total_count: records.len(),
                    records,
                    generated_at: self.source.generated_at(),
                },
                Ok(Err(e)) => {
                    log::warn!("sample fetch for {} failed: {e}", schema.name);
                    DataSample::empty(&schema.name, now)
                }
                Err(_) => {
                    log::warn!("sample fetch for {} timed out", schema.name);
                    DataSample::empty(&schema.name, now)
                }
            };

            let metrics = self.assessor.assess(&self.registry, &sample, now);
            quality.insert(schema.name.clone(), metrics);
            samples.insert(schema.name.clone(), sample);
        }

        let schema_summary = render_schema_summary(&schemas, &samples, &quality);
        let business_context = schemas
            .iter()
            .map(|s| format!("{}: {}", s.name, s.business_context))
            .collect::<Vec<_>>()
            .join("\n");
        let recommendations = band_recommendations(&quality);

        SchemaAwareContext {
            query: query.to_string(),
            schemas,
            samples,
            quality,
            schema_summary,
            business_context,
            recommendations,
            built_at: now,
        }
    }
}

fn render_schema_summary(
    schemas: &[netrag_core::DeviceSchema],
    samples: &BTreeMap<String, DataSample>,
    quality: &BTreeMap<String, netrag_core::QualityMetrics>,
) -> String {
    let mut lines = Vec::new();
    for schema in schemas {
        let fields: Vec<&str> = schema
            .fields
            .iter()
            .take(5)
            .map(|f| f.name.as_str())
            .collect();
        let total = samples.get(&schema.name).map(|s| s.total_count).unwrap_or(0);
        let band = quality
            .get(&schema.name)
            .map(|m| format!("{} {:.0}%", m.band().emoji(), m.overall * 100.0))
            .unwrap_or_else(|| "unassessed".to_string());

        lines.push(format!(
            "- {} (v{}): fields [{}], {} records available, quality {}",
            schema.name,
            schema.version,
            fields.join(", "),
            total,
            band,
        ));

        if let Some(sample) = samples.get(&schema.name) {
            if let Some(first) = sample.records.first() {
                lines.push(format!(
                    "  example: {}",
                    serde_json::Value::Object(first.fields.clone())
                ));
            }
        }
    }
    lines.join("\n")
}

/// Band-driven recommendations: red asks for a data refresh first, amber
/// proceeds with a caveat, green proceeds.
fn band_recommendations(
    quality: &BTreeMap<String, netrag_core::QualityMetrics>,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    for (schema, metrics) in quality {
        match metrics.band() {
            QualityBand::Red => recommendations.push(format!(
                "🔴 {schema}: data quality is poor; run a data refresh before relying on these results"
            )),
            QualityBand::Amber => recommendations.push(format!(
                "🟡 {schema}: proceed, but treat results with a data-quality caveat"
            )),
            QualityBand::Green => {}
        }
    }
    if recommendations.is_empty() && !quality.is_empty() {
        recommendations.push("🟢 data quality is good; proceed".to_string());
    }
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    use netrag_analysis::QualityConfig;

    use crate::source::StaticDataSource;

    fn builder(source: StaticDataSource) -> ContextBuilder {
        let registry = Arc::new(SchemaRegistry::with_builtin_schemas());
        ContextBuilder::new(
            registry,
            DataQualityAssessor::new(QualityConfig::default()),
            Arc::new(source),
            20,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn build_samples_matching_schemas() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let ctx = builder(StaticDataSource::demo(&registry))
            .build("how many ftth olts do we have?")
            .await;

        assert!(ctx.samples.contains_key("ftth_olt"));
        assert!(ctx.quality.contains_key("ftth_olt"));
        assert!(ctx.total_records() > 0);
        assert!(ctx.schema_summary.contains("ftth_olt"));
        assert_eq!(ctx.worst_band(), Some(QualityBand::Green));
        assert!(ctx.recommendations.iter().any(|r| r.contains("proceed")));
    }

    #[tokio::test]
    async fn empty_source_goes_red_with_refresh_recommendation() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let ctx = builder(StaticDataSource::new(vec![], &registry))
            .build("how many ftth olts do we have?")
            .await;

        assert_eq!(ctx.worst_band(), Some(QualityBand::Red));
        assert!(ctx
            .recommendations
            .iter()
            .any(|r| r.contains("data refresh")));
    }

    #[tokio::test]
    async fn stale_source_scores_low_freshness() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let stale = StaticDataSource::demo(&registry)
            .with_generated_at(Utc::now() - chrono::Duration::days(3));
        let ctx = builder(stale).build("ftth olt overview").await;

        let metrics = ctx.quality.get("ftth_olt").unwrap();
        assert_eq!(metrics.freshness, 0.0);
        assert!(ctx.has_low_quality_score(0.5));
    }
}
