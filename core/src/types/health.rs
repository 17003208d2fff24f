use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device health status derived from rule evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    /// Rule evaluation failed; score is 0 and the report carries a note.
    Unknown,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// Recommendation priority. Ordering is HIGH first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Comparison operator in a simple field condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "in")]
    In,
    #[serde(rename = "not_in")]
    NotIn,
}

/// One condition inside a health rule's severity group.
///
/// Either a simple field/operator/value triple or an expression in the
/// predicate language evaluated by `netrag-analysis`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleCondition {
    Field {
        field: String,
        #[serde(rename = "operator")]
        op: CompareOp,
        value: Value,
    },
    Expr {
        #[serde(rename = "condition")]
        expr: String,
    },
}

/// Signed score adjustment applied when its predicate holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    /// Predicate expression over the device record.
    pub when: String,
    /// Signed impact added to the base score of 100.
    pub impact: i32,
    pub reason: String,
}

/// Recommendation emitted when its predicate holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRule {
    pub when: String,
    pub message: String,
    pub priority: Priority,
}

/// A declarative health rule for one device kind.
///
/// At most one rule exists per (device kind, version); predicates reference
/// only fields declared by the matching schema. Rules are indexed in the
/// vector store so the engine can pick the best match semantically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthRule {
    pub id: String,
    pub device_kind: String,
    pub version: u32,
    /// Keywords folded into the rule's embedding text.
    #[serde(default)]
    pub keywords: Vec<String>,

    /// Conditions grouped by severity, declaration order preserved.
    #[serde(default)]
    pub critical_when: Vec<RuleCondition>,
    #[serde(default)]
    pub warning_when: Vec<RuleCondition>,
    #[serde(default)]
    pub healthy_when: Vec<RuleCondition>,

    #[serde(default)]
    pub scoring: Vec<ScoreAdjustment>,
    #[serde(default)]
    pub recommendations: Vec<RecommendationRule>,

    /// Device fields copied into the report summary.
    #[serde(default)]
    pub summary_fields: Vec<String>,
}

impl HealthRule {
    /// Text embedded for semantic rule selection.
    pub fn embedding_text(&self) -> String {
        let mut text = format!("health analysis {} monitoring diagnostics", self.device_kind);
        for kw in &self.keywords {
            text.push(' ');
            text.push_str(kw);
        }
        text
    }
}

/// A scoring adjustment that fired during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiredAdjustment {
    pub impact: i32,
    pub reason: String,
}

/// A recommendation that fired during evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub message: String,
    pub priority: Priority,
}

/// Result of evaluating a device against its best-matching health rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    /// Id of the rule that matched, absent when evaluation failed before
    /// selection.
    pub rule_id: Option<String>,
    /// Final score clamped to [0, 100].
    pub score: u32,
    pub status: HealthStatus,
    /// Adjustments that fired, in declaration order.
    pub adjustments: Vec<FiredAdjustment>,
    /// Fired recommendations in HIGH, MEDIUM, LOW blocks, each preserving
    /// declaration order.
    pub recommendations: Vec<Recommendation>,
    /// The device fields named by the rule's summary list.
    pub summary: Map<String, Value>,
    /// Visible note for degraded evaluations (status UNKNOWN).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl HealthReport {
    /// Report used when rule evaluation itself failed: the device stays in
    /// the batch, labeled UNKNOWN with score 0.
    pub fn unknown(note: impl Into<String>) -> Self {
        Self {
            rule_id: None,
            score: 0,
            status: HealthStatus::Unknown,
            adjustments: vec![],
            recommendations: vec![],
            summary: Map::new(),
            note: Some(note.into()),
        }
    }
}
