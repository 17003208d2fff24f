//! Built-in health rule set for the network fleet.
//!
//! These rules are the authoritative source for scoring impacts,
//! recommendation text, and priorities. They are indexed into the vector
//! store at startup so selection can run semantically.

use serde_json::json;

use netrag_core::{
    CompareOp, HealthRule, Priority, RecommendationRule, RuleCondition, ScoreAdjustment,
};

use super::EnvironmentOverride;

pub fn builtin_rules() -> Vec<HealthRule> {
    vec![ftth_olt_rule(), mobile_modem_rule()]
}

pub fn environment_overrides() -> Vec<EnvironmentOverride> {
    vec![
        EnvironmentOverride {
            environment: "PRODUCTION".to_string(),
            min_service_count: 100,
            require_inmanta: true,
            require_complete_config: true,
        },
        EnvironmentOverride {
            environment: "UAT".to_string(),
            min_service_count: 10,
            require_inmanta: false,
            require_complete_config: false,
        },
        EnvironmentOverride {
            environment: "TEST".to_string(),
            min_service_count: 1,
            require_inmanta: false,
            require_complete_config: false,
        },
    ]
}

fn ftth_olt_rule() -> HealthRule {
    HealthRule {
        id: "health_rule_ftth_olt_001".to_string(),
        device_kind: "ftth_olt".to_string(),
        version: 1,
        keywords: [
            "health",
            "assessment",
            "ftth",
            "olt",
            "scoring",
            "inmanta",
            "configuration",
            "services",
            "bandwidth",
        ]
        .map(String::from)
        .to_vec(),
        critical_when: vec![
            RuleCondition::Field {
                field: "service_count".to_string(),
                op: CompareOp::Eq,
                value: json!(0),
            },
            RuleCondition::Field {
                field: "complete_config".to_string(),
                op: CompareOp::Eq,
                value: json!(false),
            },
            RuleCondition::Expr {
                expr: "environment == 'PRODUCTION' and not managed_by_inmanta".to_string(),
            },
        ],
        warning_when: vec![
            RuleCondition::Field {
                field: "service_count".to_string(),
                op: CompareOp::Lt,
                value: json!(50),
            },
            RuleCondition::Field {
                field: "managed_by_inmanta".to_string(),
                op: CompareOp::Eq,
                value: json!(false),
            },
        ],
        healthy_when: vec![RuleCondition::Expr {
            expr: "service_count >= 50 and managed_by_inmanta and complete_config".to_string(),
        }],
        scoring: vec![
            ScoreAdjustment {
                when: "service_count == 0".to_string(),
                impact: -50,
                reason: "No services configured".to_string(),
            },
            ScoreAdjustment {
                when: "not managed_by_inmanta".to_string(),
                impact: -30,
                reason: "Manual management".to_string(),
            },
            ScoreAdjustment {
                when: "not complete_config".to_string(),
                impact: -40,
                reason: "Incomplete configuration".to_string(),
            },
            ScoreAdjustment {
                when: "service_count > 0 and service_count < 50".to_string(),
                impact: -20,
                reason: "Low utilization".to_string(),
            },
            ScoreAdjustment {
                when: "bandwidth_gbps >= 100".to_string(),
                impact: 10,
                reason: "High capacity".to_string(),
            },
        ],
        recommendations: vec![
            RecommendationRule {
                when: "service_count == 0".to_string(),
                message: "URGENT: Configure services for this OLT immediately".to_string(),
                priority: Priority::High,
            },
            RecommendationRule {
                when: "not complete_config".to_string(),
                message: "Complete device configuration to ensure stability".to_string(),
                priority: Priority::High,
            },
            RecommendationRule {
                when: "not managed_by_inmanta".to_string(),
                message: "Migrate to Inmanta for automated management".to_string(),
                priority: Priority::Medium,
            },
            RecommendationRule {
                when: "bandwidth_gbps < 10".to_string(),
                message: "Consider a bandwidth upgrade for better performance".to_string(),
                priority: Priority::Low,
            },
        ],
        summary_fields: [
            "name",
            "region",
            "environment",
            "bandwidth_gbps",
            "service_count",
            "managed_by_inmanta",
            "complete_config",
            "esi_name",
        ]
        .map(String::from)
        .to_vec(),
    }
}

fn mobile_modem_rule() -> HealthRule {
    HealthRule {
        id: "health_rule_mobile_modem_001".to_string(),
        device_kind: "mobile_modem".to_string(),
        version: 1,
        keywords: ["health", "mobile", "modem", "connectivity", "temperature"]
            .map(String::from)
            .to_vec(),
        critical_when: vec![
            RuleCondition::Field {
                field: "status".to_string(),
                op: CompareOp::In,
                value: json!(["DISCONNECTED", "ERROR"]),
            },
            RuleCondition::Field {
                field: "temperature_celsius".to_string(),
                op: CompareOp::Gt,
                value: json!(70),
            },
        ],
        warning_when: vec![
            RuleCondition::Field {
                field: "status".to_string(),
                op: CompareOp::Eq,
                value: json!("CONNECTING"),
            },
            RuleCondition::Field {
                field: "throughput_mbps".to_string(),
                op: CompareOp::Lt,
                value: json!(10),
            },
            RuleCondition::Field {
                field: "temperature_celsius".to_string(),
                op: CompareOp::Gt,
                value: json!(60),
            },
        ],
        healthy_when: vec![RuleCondition::Expr {
            expr: "status == 'CONNECTED' and temperature_celsius <= 60".to_string(),
        }],
        scoring: vec![
            ScoreAdjustment {
                when: "status == 'DISCONNECTED'".to_string(),
                impact: -50,
                reason: "Modem disconnected".to_string(),
            },
            ScoreAdjustment {
                when: "status == 'ERROR'".to_string(),
                impact: -50,
                reason: "Modem in error state".to_string(),
            },
            ScoreAdjustment {
                when: "temperature_celsius > 70".to_string(),
                impact: -40,
                reason: "Overheating".to_string(),
            },
            ScoreAdjustment {
                when: "temperature_celsius > 60 and temperature_celsius <= 70".to_string(),
                impact: -20,
                reason: "Elevated temperature".to_string(),
            },
            ScoreAdjustment {
                when: "throughput_mbps < 10".to_string(),
                impact: -20,
                reason: "Low throughput".to_string(),
            },
        ],
        recommendations: vec![
            RecommendationRule {
                when: "status == 'DISCONNECTED'".to_string(),
                message: "Re-establish connectivity and verify the subscriber profile".to_string(),
                priority: Priority::High,
            },
            RecommendationRule {
                when: "status == 'ERROR'".to_string(),
                message: "Collect modem diagnostics and reset the session".to_string(),
                priority: Priority::High,
            },
            RecommendationRule {
                when: "temperature_celsius > 70".to_string(),
                message: "Inspect ventilation; sustained overheating shortens hardware life"
                    .to_string(),
                priority: Priority::High,
            },
            RecommendationRule {
                when: "throughput_mbps < 10".to_string(),
                message: "Review radio conditions for this modem".to_string(),
                priority: Priority::Low,
            },
        ],
        summary_fields: [
            "serial_number",
            "hardware_type",
            "status",
            "throughput_mbps",
            "temperature_celsius",
        ]
        .map(String::from)
        .to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_rule_per_kind_and_version() {
        let rules = builtin_rules();
        let mut keys: Vec<(String, u32)> = rules
            .iter()
            .map(|r| (r.device_kind.clone(), r.version))
            .collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), rules.len());
    }

    #[test]
    fn every_predicate_in_the_rule_set_parses() {
        for rule in builtin_rules() {
            for adjustment in &rule.scoring {
                crate::health::predicate::Predicate::parse(&adjustment.when)
                    .unwrap_or_else(|e| panic!("{}: {e}", rule.id));
            }
            for rec in &rule.recommendations {
                crate::health::predicate::Predicate::parse(&rec.when)
                    .unwrap_or_else(|e| panic!("{}: {e}", rule.id));
            }
        }
    }

    #[test]
    fn overrides_cover_all_environments() {
        let envs: Vec<String> = environment_overrides()
            .into_iter()
            .map(|o| o.environment)
            .collect();
        assert_eq!(envs, vec!["PRODUCTION", "UAT", "TEST"]);
    }
}
