//! Data-quality assessment for live device samples.
//!
//! Four component scores (completeness, freshness, consistency, accuracy)
//! combine into a weighted overall score and a coarse band. The assessor is
//! synchronous and pure given the sample and the clock.

use chrono::{DateTime, Utc};

use netrag_core::{DataSample, DeviceRecord, DeviceSchema, FieldType, QualityMetrics};

use crate::registry::SchemaRegistry;

const COMPLETENESS_WEIGHT: f64 = 0.30;
const FRESHNESS_WEIGHT: f64 = 0.25;
const CONSISTENCY_WEIGHT: f64 = 0.25;
const ACCURACY_WEIGHT: f64 = 0.20;

/// Thresholds for freshness decay and sampling.
#[derive(Debug, Clone)]
pub struct QualityConfig {
    /// Records considered per assessment; larger samples are truncated.
    pub sample_cap: usize,
    /// Samples younger than this are fully fresh.
    pub fresh_window_mins: i64,
    /// Freshness decays linearly to zero at this horizon.
    pub decay_horizon_hours: i64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            sample_cap: 200,
            fresh_window_mins: 15,
            decay_horizon_hours: 24,
        }
    }
}

/// Scores a live sample against its schema.
pub struct DataQualityAssessor {
    config: QualityConfig,
}

impl DataQualityAssessor {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// Assess a sample. An empty sample scores zero on every axis.
    pub fn assess(
        &self,
        registry: &SchemaRegistry,
        sample: &DataSample,
        now: DateTime<Utc>,
    ) -> QualityMetrics {
        let records: Vec<&DeviceRecord> =
            sample.records.iter().take(self.config.sample_cap).collect();

        let schema = match registry.get(&sample.schema_name) {
            Some(schema) if !records.is_empty() => schema,
            _ => {
                return QualityMetrics {
                    schema_name: sample.schema_name.clone(),
                    record_count: 0,
                    completeness: 0.0,
                    freshness: 0.0,
                    consistency: 0.0,
                    accuracy: 0.0,
                    overall: 0.0,
                    assessed_at: now,
                    issues: vec!["no data available".to_string()],
                    recommendations: vec![
                        "request a data refresh before relying on this source".to_string(),
                    ],
                };
            }
        };

        let completeness = completeness_score(schema, &records);
        let freshness = self.freshness_score(sample.generated_at, now);
        let consistency = consistency_score(schema, &records);
        let accuracy = accuracy_score(&sample.schema_name, &records);

        let overall = COMPLETENESS_WEIGHT * completeness
            + FRESHNESS_WEIGHT * freshness
            + CONSISTENCY_WEIGHT * consistency
            + ACCURACY_WEIGHT * accuracy;

        let mut issues = Vec::new();
        let mut recommendations = Vec::new();
        if completeness < 0.7 {
            issues.push(format!("low completeness ({:.0}%)", completeness * 100.0));
            recommendations.push("review collection for missing required fields".to_string());
        }
        if freshness < 0.5 {
            issues.push(format!("stale sample (freshness {:.0}%)", freshness * 100.0));
            recommendations.push("increase the data refresh frequency".to_string());
        }
        if consistency < 0.8 {
            issues.push(format!("format inconsistencies ({:.0}%)", consistency * 100.0));
            recommendations.push("enforce schema validation at the source".to_string());
        }
        if accuracy < 0.8 {
            issues.push(format!("cross-field violations ({:.0}%)", accuracy * 100.0));
            recommendations.push("verify source reliability for this schema".to_string());
        }

        QualityMetrics {
            schema_name: sample.schema_name.clone(),
            record_count: records.len(),
            completeness,
            freshness,
            consistency,
            accuracy,
            overall,
            assessed_at: now,
            issues,
            recommendations,
        }
    }

    /// 1.0 inside the fresh window, linear decay to 0 at the horizon.
    fn freshness_score(&self, generated_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
        let age_mins = now.signed_duration_since(generated_at).num_minutes();
        let fresh = self.config.fresh_window_mins;
        let horizon = self.config.decay_horizon_hours * 60;
        if age_mins <= fresh {
            1.0
        } else if age_mins >= horizon {
            0.0
        } else {
            1.0 - (age_mins - fresh) as f64 / (horizon - fresh) as f64
        }
    }
}

/// Fraction of required fields present and non-empty, averaged over records.
fn completeness_score(schema: &DeviceSchema, records: &[&DeviceRecord]) -> f64 {
    let required: Vec<&str> = schema.required_fields().map(|f| f.name.as_str()).collect();
    if required.is_empty() {
        return 1.0;
    }
    let total = records.len() * required.len();
    let present: usize = records
        .iter()
        .map(|r| required.iter().filter(|f| r.has_value(f)).count())
        .sum();
    present as f64 / total as f64
}

/// Fraction of records whose present enum/pattern fields all conform.
fn consistency_score(schema: &DeviceSchema, records: &[&DeviceRecord]) -> f64 {
    let constrained: Vec<&netrag_core::FieldSpec> = schema
        .fields
        .iter()
        .filter(|f| matches!(f.field_type, FieldType::Enum(_) | FieldType::Pattern(_)))
        .collect();
    if constrained.is_empty() {
        return 1.0;
    }

    let conforming = records
        .iter()
        .filter(|record| {
            constrained.iter().all(|spec| {
                match record.str_field(&spec.name) {
                    None => true,
                    Some(value) => match &spec.field_type {
                        FieldType::Enum(allowed) => allowed.iter().any(|a| a == value),
                        FieldType::Pattern(pattern) => {
                            regex::Regex::new(&format!("^(?:{pattern})$"))
                                .map(|re| re.is_match(value))
                                .unwrap_or(false)
                        }
                        _ => true,
                    },
                }
            })
        })
        .count();
    conforming as f64 / records.len() as f64
}

/// Fraction of records whose cross-field invariants hold. Invariants are
/// declared per schema; schemas without invariants score 1.0.
fn accuracy_score(schema_name: &str, records: &[&DeviceRecord]) -> f64 {
    let accurate = records
        .iter()
        .filter(|r| record_is_accurate(schema_name, r))
        .count();
    accurate as f64 / records.len() as f64
}

fn record_is_accurate(schema_name: &str, record: &DeviceRecord) -> bool {
    match schema_name {
        "ftth_olt" => {
            let service_count = record.int_field("service_count").unwrap_or(0);
            let managed = record.bool_field("managed_by_inmanta").unwrap_or(false);
            let complete = record.bool_field("complete_config").unwrap_or(false);
            let bandwidth = record.int_field("bandwidth_gbps").unwrap_or(0);

            // A complete configuration implies automated management and at
            // least one service.
            if complete && !(managed && service_count > 0) {
                return false;
            }
            if record.str_field("environment") == Some("PRODUCTION") && bandwidth <= 0 {
                return false;
            }
            (0..=10_000).contains(&service_count)
        }
        "mobile_modem" => record
            .str_field("serial_number")
            .map(|s| s.starts_with("LPL"))
            .unwrap_or(false),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn olt(value: serde_json::Value) -> DeviceRecord {
        match value {
            serde_json::Value::Object(map) => DeviceRecord::new("ftth_olt", map),
            _ => panic!("expected object"),
        }
    }

    fn good_olt(name: &str) -> DeviceRecord {
        olt(json!({
            "name": name,
            "region": "HOBO",
            "environment": "PRODUCTION",
            "bandwidth_gbps": 100,
            "service_count": 200,
            "managed_by_inmanta": true,
            "complete_config": true
        }))
    }

    fn sample(records: Vec<DeviceRecord>, generated_at: DateTime<Utc>) -> DataSample {
        DataSample {
            schema_name: "ftth_olt".to_string(),
            total_count: records.len(),
            records,
            generated_at,
        }
    }

    fn assess(sample: &DataSample, now: DateTime<Utc>) -> QualityMetrics {
        let registry = SchemaRegistry::with_builtin_schemas();
        DataQualityAssessor::new(QualityConfig::default()).assess(&registry, sample, now)
    }

    #[test]
    fn empty_sample_scores_zero_and_recommends_refresh() {
        let now = Utc::now();
        let metrics = assess(&sample(vec![], now), now);
        assert_eq!(metrics.completeness, 0.0);
        assert_eq!(metrics.freshness, 0.0);
        assert_eq!(metrics.consistency, 0.0);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.overall, 0.0);
        assert_eq!(metrics.band(), netrag_core::QualityBand::Red);
        assert!(metrics.recommendations.iter().any(|r| r.contains("refresh")));
    }

    #[test]
    fn fresh_complete_sample_is_green() {
        let now = Utc::now();
        let metrics = assess(&sample(vec![good_olt("OLT17PROP01"), good_olt("OLT70AALS01")], now), now);
        assert_eq!(metrics.completeness, 1.0);
        assert_eq!(metrics.freshness, 1.0);
        assert_eq!(metrics.consistency, 1.0);
        assert_eq!(metrics.accuracy, 1.0);
        assert!((metrics.overall - 1.0).abs() < 1e-9);
        assert_eq!(metrics.band(), netrag_core::QualityBand::Green);
    }

    #[test]
    fn freshness_decays_linearly_and_hits_zero() {
        let now = Utc::now();
        let config = QualityConfig::default();
        let assessor = DataQualityAssessor::new(config);

        assert_eq!(assessor.freshness_score(now - chrono::Duration::minutes(10), now), 1.0);
        let half_day = assessor.freshness_score(now - chrono::Duration::hours(12), now);
        assert!(half_day > 0.0 && half_day < 1.0);
        assert_eq!(assessor.freshness_score(now - chrono::Duration::hours(25), now), 0.0);
    }

    #[test]
    fn missing_required_fields_lower_completeness() {
        let now = Utc::now();
        let partial = olt(json!({"name": "OLT17PROP01", "region": "HOBO"}));
        let metrics = assess(&sample(vec![partial], now), now);
        assert!(metrics.completeness < 1.0);
        assert!(metrics.issues.iter().any(|i| i.contains("completeness")));
    }

    #[test]
    fn enum_violation_lowers_consistency() {
        let now = Utc::now();
        let bad = olt(json!({
            "name": "OLT17PROP01", "region": "MARS", "environment": "PRODUCTION",
            "bandwidth_gbps": 10, "service_count": 5,
            "managed_by_inmanta": true, "complete_config": false
        }));
        let metrics = assess(&sample(vec![bad, good_olt("OLT70AALS01")], now), now);
        assert!((metrics.consistency - 0.5).abs() < 1e-9);
    }

    #[test]
    fn cross_field_invariant_violation_lowers_accuracy() {
        let now = Utc::now();
        // complete_config without management is contradictory.
        let contradictory = olt(json!({
            "name": "OLT17PROP01", "region": "HOBO", "environment": "PRODUCTION",
            "bandwidth_gbps": 10, "service_count": 100,
            "managed_by_inmanta": false, "complete_config": true
        }));
        let metrics = assess(&sample(vec![contradictory, good_olt("OLT70AALS01")], now), now);
        assert!((metrics.accuracy - 0.5).abs() < 1e-9);
    }

    #[test]
    fn overall_uses_documented_weights() {
        let now = Utc::now();
        let stale = sample(vec![good_olt("OLT17PROP01")], now - chrono::Duration::hours(30));
        let metrics = assess(&stale, now);
        assert_eq!(metrics.freshness, 0.0);
        // 0.30 + 0.25·0 + 0.25 + 0.20 with all other components at 1.0.
        assert!((metrics.overall - 0.75).abs() < 1e-9);
    }
}
