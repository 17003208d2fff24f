//! Knowledge-driven health analysis.
//!
//! The engine selects the best-matching rule for a device via vector
//! similarity over indexed rule embeddings, then evaluates the rule's
//! conditions, scoring adjustments, and recommendations. Evaluation is
//! synchronous with no yield points; only rule selection awaits.

pub mod builtin;
pub mod predicate;

use std::sync::Arc;

use serde_json::Value;

use netrag_core::{
    CompareOp, DeviceRecord, FiredAdjustment, HealthReport, HealthRule, HealthStatus,
    Recommendation, RuleCondition,
};
use netrag_rag::embeddings::{EmbeddingProvider, FallbackEmbedder};
use netrag_rag::store::{RecordKind, VectorMeta, VectorStore};
use netrag_rag::RagError;

use crate::error::AnalysisError;
use self::predicate::Predicate;

/// Environment-specific minimums that can escalate a status to CRITICAL.
///
/// Overrides never relax a status; they only force CRITICAL when a device
/// in the named environment misses its floor.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EnvironmentOverride {
    pub environment: String,
    pub min_service_count: i64,
    pub require_inmanta: bool,
    pub require_complete_config: bool,
}

impl EnvironmentOverride {
    fn violated_by(&self, device: &DeviceRecord) -> bool {
        let service_count = device.int_field("service_count").unwrap_or(0);
        let managed = device.bool_field("managed_by_inmanta").unwrap_or(false);
        let complete = device.bool_field("complete_config").unwrap_or(false);

        service_count < self.min_service_count
            || (self.require_inmanta && !managed)
            || (self.require_complete_config && !complete)
    }
}

/// Evaluates devices against the best-matching health rule.
pub struct HealthRuleEngine {
    rules: Vec<HealthRule>,
    overrides: Vec<EnvironmentOverride>,
    vectors: Arc<VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    fallback: FallbackEmbedder,
}

impl HealthRuleEngine {
    pub fn new(
        rules: Vec<HealthRule>,
        overrides: Vec<EnvironmentOverride>,
        vectors: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        fallback: FallbackEmbedder,
    ) -> Self {
        Self {
            rules,
            overrides,
            vectors,
            embedder,
            fallback,
        }
    }

    /// Engine loaded with the built-in rule set.
    pub fn with_builtin_rules(
        vectors: Arc<VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        fallback: FallbackEmbedder,
    ) -> Self {
        Self::new(
            builtin::builtin_rules(),
            builtin::environment_overrides(),
            vectors,
            embedder,
            fallback,
        )
    }

    pub fn rules(&self) -> &[HealthRule] {
        &self.rules
    }

    /// Index every rule's embedding in the vector store so selection can run
    /// semantically. Called once at startup.
    pub async fn index_rules(&self) -> Result<usize, RagError> {
        for rule in &self.rules {
            let text = rule.embedding_text();
            let (vector, model) = match self.embedder.embed(&text).await {
                Ok(v) => (v, self.embedder.model_name().to_string()),
                Err(e) => {
                    log::warn!("rule embedding failed ({e}); using fallback embedder");
                    (
                        self.fallback.embed_text(&text),
                        self.fallback.model_name().to_string(),
                    )
                }
            };
            self.vectors.upsert(
                &rule.id,
                vector,
                VectorMeta::health_rule(rule.keywords.clone()).with_model(model),
            )?;
        }
        Ok(self.rules.len())
    }

    /// Evaluate a device. Total: selection or evaluation failures yield an
    /// UNKNOWN report instead of aborting the batch.
    pub async fn evaluate(&self, device: &DeviceRecord) -> HealthReport {
        let Some(rule) = self.select_rule(&device.schema_name).await else {
            return HealthReport::unknown(format!(
                "no health rule available for {}",
                device.schema_name
            ));
        };

        match self.evaluate_with_rule(rule, device) {
            Ok(report) => report,
            Err(e) => {
                log::error!("health rule {} failed on {}: {e}", rule.id, device.display_name());
                HealthReport::unknown(format!("rule evaluation failed: {e}"))
            }
        }
    }

    /// Pick the rule for a device kind: vector search over rule embeddings,
    /// restricted to rules of the same kind. Ties on similarity go to the
    /// higher version, then the lexicographically smaller id. Falls back to
    /// a direct kind lookup when the vector path returns nothing.
    async fn select_rule(&self, kind: &str) -> Option<&HealthRule> {
        let query = format!("health analysis {kind} monitoring diagnostics");
        let vector = match self.embedder.embed(&query).await {
            Ok(v) => v,
            Err(_) => self.fallback.embed_text(&query),
        };

        let hits = self
            .vectors
            .search(&vector, self.rules.len().max(1), -1.0, Some(RecordKind::HealthRule));

        let mut candidates: Vec<(&HealthRule, f32)> = hits
            .iter()
            .filter_map(|hit| {
                self.rules
                    .iter()
                    .find(|r| r.id == hit.id && r.device_kind == kind)
                    .map(|r| (r, hit.similarity))
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.0.version.cmp(&a.0.version))
                .then_with(|| a.0.id.cmp(&b.0.id))
        });

        candidates
            .first()
            .map(|(rule, _)| *rule)
            .or_else(|| {
                self.rules
                    .iter()
                    .filter(|r| r.device_kind == kind)
                    .max_by(|a, b| a.version.cmp(&b.version).then(b.id.cmp(&a.id)))
            })
    }

    /// Synchronous evaluation of one rule against one device.
    fn evaluate_with_rule(
        &self,
        rule: &HealthRule,
        device: &DeviceRecord,
    ) -> Result<HealthReport, AnalysisError> {
        // Scoring: base 100, apply every adjustment whose predicate holds.
        let mut raw_score: i64 = 100;
        let mut adjustments = Vec::new();
        for adjustment in &rule.scoring {
            if Predicate::parse(&adjustment.when)?.eval(device) {
                raw_score += i64::from(adjustment.impact);
                adjustments.push(FiredAdjustment {
                    impact: adjustment.impact,
                    reason: adjustment.reason.clone(),
                });
            }
        }
        let score = raw_score.clamp(0, 100) as u32;

        let mut status = if score >= 80 {
            HealthStatus::Healthy
        } else if score >= 50 {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        };

        // Conditions override the score-derived status: CRITICAL always
        // wins; WARNING keeps a healthy score from masking a live warning;
        // the HEALTHY group floors the status once no adverse condition
        // holds.
        if any_condition_holds(&rule.critical_when, device)? {
            status = HealthStatus::Critical;
        } else if any_condition_holds(&rule.warning_when, device)? {
            if status == HealthStatus::Healthy {
                status = HealthStatus::Warning;
            }
        } else if any_condition_holds(&rule.healthy_when, device)? {
            status = HealthStatus::Healthy;
        }

        if status != HealthStatus::Critical {
            if let Some(environment) = device.str_field("environment") {
                let escalate = self
                    .overrides
                    .iter()
                    .find(|o| o.environment == environment)
                    .map(|o| o.violated_by(device))
                    .unwrap_or(false);
                if escalate {
                    status = HealthStatus::Critical;
                }
            }
        }

        // Fired recommendations in HIGH, MEDIUM, LOW blocks; the stable sort
        // preserves declaration order inside each block.
        let mut recommendations = Vec::new();
        for rec in &rule.recommendations {
            if Predicate::parse(&rec.when)?.eval(device) {
                recommendations.push(Recommendation {
                    message: rec.message.clone(),
                    priority: rec.priority,
                });
            }
        }
        recommendations.sort_by_key(|r| r.priority);

        let mut summary = serde_json::Map::new();
        for field in &rule.summary_fields {
            if let Some(value) = device.get(field) {
                summary.insert(field.clone(), value.clone());
            }
        }

        Ok(HealthReport {
            rule_id: Some(rule.id.clone()),
            score,
            status,
            adjustments,
            recommendations,
            summary,
            note: None,
        })
    }
}

fn any_condition_holds(
    conditions: &[RuleCondition],
    device: &DeviceRecord,
) -> Result<bool, AnalysisError> {
    for condition in conditions {
        let holds = match condition {
            RuleCondition::Field { field, op, value } => {
                field_condition_holds(device, field, *op, value)
            }
            RuleCondition::Expr { expr } => Predicate::parse(expr)?.eval(device),
        };
        if holds {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Evaluate a simple field/operator/value condition. Absent fields are
/// false under every operator.
fn field_condition_holds(device: &DeviceRecord, field: &str, op: CompareOp, value: &Value) -> bool {
    let Some(actual) = device.get(field) else {
        return false;
    };
    if actual.is_null() {
        return false;
    }

    match op {
        CompareOp::In => value
            .as_array()
            .map(|list| list.iter().any(|v| v == actual))
            .unwrap_or(false),
        CompareOp::NotIn => value
            .as_array()
            .map(|list| !list.iter().any(|v| v == actual))
            .unwrap_or(false),
        CompareOp::Eq => actual == value,
        CompareOp::Ne => actual != value,
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            let (Some(a), Some(b)) = (actual.as_f64(), value.as_f64()) else {
                return false;
            };
            match op {
                CompareOp::Lt => a < b,
                CompareOp::Le => a <= b,
                CompareOp::Gt => a > b,
                CompareOp::Ge => a >= b,
                _ => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netrag_core::{Priority, ScoreAdjustment};
    use serde_json::json;

    fn engine() -> HealthRuleEngine {
        let fallback = FallbackEmbedder::new(32, FallbackEmbedder::default_boosts());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(fallback.clone());
        let vectors = Arc::new(VectorStore::new(32));
        HealthRuleEngine::with_builtin_rules(vectors, embedder, fallback)
    }

    async fn indexed_engine() -> HealthRuleEngine {
        let e = engine();
        e.index_rules().await.unwrap();
        e
    }

    fn olt(service_count: i64, managed: bool, complete: bool, bandwidth: i64) -> DeviceRecord {
        let fields = match json!({
            "name": "OLT17PROP01",
            "region": "HOBO",
            "environment": "UAT",
            "bandwidth_gbps": bandwidth,
            "service_count": service_count,
            "managed_by_inmanta": managed,
            "complete_config": complete
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        DeviceRecord::new("ftth_olt", fields)
    }

    #[tokio::test]
    async fn reference_scoring_matrix() {
        let engine = indexed_engine().await;

        // (service_count, managed, complete, bandwidth) -> (score, status)
        let cases = [
            ((200, true, true, 100), (100, HealthStatus::Healthy)),
            ((150, false, false, 10), (30, HealthStatus::Critical)),
            ((0, true, false, 10), (10, HealthStatus::Critical)),
            ((50, true, true, 10), (100, HealthStatus::Healthy)),
        ];
        for ((sc, managed, complete, bw), (score, status)) in cases {
            let report = engine.evaluate(&olt(sc, managed, complete, bw)).await;
            assert_eq!(report.score, score, "score for sc={sc}");
            assert_eq!(report.status, status, "status for sc={sc}");
        }
    }

    #[tokio::test]
    async fn score_is_clamped_to_bounds() {
        let engine = indexed_engine().await;
        // Everything wrong: 100 - 50 - 30 - 40 = -20, clamps to 0.
        let report = engine.evaluate(&olt(0, false, false, 1)).await;
        assert_eq!(report.score, 0);

        // Everything right plus capacity bonus: 110 clamps to 100.
        let report = engine.evaluate(&olt(500, true, true, 400)).await;
        assert_eq!(report.score, 100);
    }

    #[tokio::test]
    async fn evaluation_is_deterministic() {
        let engine = indexed_engine().await;
        let device = olt(30, false, true, 50);
        let first = engine.evaluate(&device).await;
        for _ in 0..5 {
            let again = engine.evaluate(&device).await;
            assert_eq!(again.score, first.score);
            assert_eq!(again.status, first.status);
            assert_eq!(again.adjustments.len(), first.adjustments.len());
        }
    }

    #[tokio::test]
    async fn critical_condition_forces_status() {
        let engine = indexed_engine().await;
        // Score lands at 50 (100 - 40 - 20 + 10), WARNING by score, but the
        // incomplete-config critical condition fires.
        let report = engine.evaluate(&olt(40, true, false, 400)).await;
        assert_eq!(report.status, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn warning_condition_blocks_healthy() {
        let engine = indexed_engine().await;
        // Low utilization only: 100 - 20 = 80 would be HEALTHY by score,
        // but the service_count < 50 warning holds.
        let report = engine.evaluate(&olt(40, true, true, 50)).await;
        assert_eq!(report.score, 80);
        assert_eq!(report.status, HealthStatus::Warning);
    }

    #[tokio::test]
    async fn healthy_condition_floors_a_low_score() {
        let fallback = FallbackEmbedder::new(32, FallbackEmbedder::default_boosts());
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(fallback.clone());
        let vectors = Arc::new(VectorStore::new(32));
        let rule = HealthRule {
            id: "health_rule_ftth_olt_999".to_string(),
            device_kind: "ftth_olt".to_string(),
            version: 9,
            keywords: vec![],
            critical_when: vec![],
            warning_when: vec![],
            healthy_when: vec![RuleCondition::Expr {
                expr: "managed_by_inmanta".to_string(),
            }],
            scoring: vec![ScoreAdjustment {
                when: "not complete_config".to_string(),
                impact: -30,
                reason: "Incomplete configuration".to_string(),
            }],
            recommendations: vec![],
            summary_fields: vec![],
        };
        let engine = HealthRuleEngine::new(vec![rule], vec![], vectors, embedder, fallback);

        // Score 70 would read WARNING, but no adverse condition holds and
        // the healthy group does.
        let report = engine.evaluate(&olt(200, true, false, 10)).await;
        assert_eq!(report.score, 70);
        assert_eq!(report.status, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn production_override_escalates() {
        let engine = indexed_engine().await;
        let mut device = olt(50, true, true, 100);
        device
            .fields
            .insert("environment".to_string(), json!("PRODUCTION"));
        // 50 services is fine in UAT but below the production floor of 100.
        let report = engine.evaluate(&device).await;
        assert_eq!(report.status, HealthStatus::Critical);
    }

    #[tokio::test]
    async fn recommendations_ordered_by_priority_blocks() {
        let engine = indexed_engine().await;
        // Fires: no services (HIGH), incomplete config (HIGH), not managed
        // (MEDIUM), low bandwidth (LOW).
        let report = engine.evaluate(&olt(0, false, false, 5)).await;
        let priorities: Vec<Priority> =
            report.recommendations.iter().map(|r| r.priority).collect();
        let mut sorted = priorities.clone();
        sorted.sort();
        assert_eq!(priorities, sorted);
        assert_eq!(priorities[0], Priority::High);
        assert!(report.recommendations[0].message.contains("Configure services"));
    }

    #[tokio::test]
    async fn summary_copies_rule_fields() {
        let engine = indexed_engine().await;
        let report = engine.evaluate(&olt(200, true, true, 100)).await;
        assert_eq!(report.summary.get("name"), Some(&json!("OLT17PROP01")));
        assert_eq!(report.summary.get("region"), Some(&json!("HOBO")));
    }

    #[tokio::test]
    async fn unknown_kind_gets_unknown_report() {
        let engine = indexed_engine().await;
        let device = DeviceRecord::new("toaster", serde_json::Map::new());
        let report = engine.evaluate(&device).await;
        assert_eq!(report.status, HealthStatus::Unknown);
        assert_eq!(report.score, 0);
        assert!(report.note.is_some());
    }

    #[tokio::test]
    async fn selection_works_without_indexed_vectors() {
        // No index_rules call: the engine falls back to kind lookup.
        let engine = engine();
        let report = engine.evaluate(&olt(200, true, true, 100)).await;
        assert_eq!(report.status, HealthStatus::Healthy);
        assert_eq!(report.rule_id.as_deref(), Some("health_rule_ftth_olt_001"));
    }

    #[test]
    fn field_condition_membership() {
        let mut fields = serde_json::Map::new();
        fields.insert("status".to_string(), json!("ERROR"));
        let device = DeviceRecord::new("mobile_modem", fields);

        assert!(field_condition_holds(
            &device,
            "status",
            CompareOp::In,
            &json!(["DISCONNECTED", "ERROR"])
        ));
        assert!(!field_condition_holds(
            &device,
            "status",
            CompareOp::NotIn,
            &json!(["DISCONNECTED", "ERROR"])
        ));
        // Absent field: false under every operator.
        assert!(!field_condition_holds(
            &device,
            "missing",
            CompareOp::In,
            &json!(["X"])
        ));
        assert!(!field_condition_holds(&device, "missing", CompareOp::Eq, &json!("X")));
    }
}
