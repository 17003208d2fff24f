//! Schema registry for the network data shapes.
//!
//! Declarative and read-only after initialization. Each schema carries the
//! intent keywords that connect free-text queries to it; matching is a pure
//! function of the query text with ties broken by registration order.

use regex::Regex;
use serde_json::Value;

use netrag_core::{DeviceRecord, DeviceSchema, FieldSpec, FieldType};

use crate::error::AnalysisError;

/// Registry of device schemas, in registration order.
pub struct SchemaRegistry {
    schemas: Vec<DeviceSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<DeviceSchema>) -> Self {
        Self { schemas }
    }

    /// Registry pre-loaded with the network fleet schemas.
    pub fn with_builtin_schemas() -> Self {
        Self::new(builtin_schemas())
    }

    pub fn get(&self, name: &str) -> Option<&DeviceSchema> {
        self.schemas.iter().find(|s| s.name == name)
    }

    pub fn all(&self) -> &[DeviceSchema] {
        &self.schemas
    }

    /// Schemas whose intent keywords intersect the query tokens, in
    /// registration order. Falls back to the common pair when nothing
    /// matches so a vague query still gets context.
    pub fn schemas_for_query(&self, query: &str) -> Vec<&DeviceSchema> {
        let lowered = query.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|t| !t.is_empty())
            .collect();

        let matched: Vec<&DeviceSchema> = self
            .schemas
            .iter()
            .filter(|schema| {
                schema
                    .intent_keywords
                    .iter()
                    .any(|kw| tokens.iter().any(|t| t.starts_with(kw.as_str())))
            })
            .collect();

        if !matched.is_empty() {
            return matched;
        }

        ["ftth_olt", "team"]
            .iter()
            .filter_map(|name| self.get(name))
            .collect()
    }

    /// Validate a record against its declared schema.
    ///
    /// Checks the schema tag, required fields, enum membership, full-match
    /// patterns, and non-negative integers. Runs once at the data-source
    /// boundary so downstream code sees only conforming records.
    pub fn validate_record(&self, record: &DeviceRecord) -> Result<(), AnalysisError> {
        let schema = self
            .get(&record.schema_name)
            .ok_or_else(|| AnalysisError::UnknownSchema(record.schema_name.clone()))?;

        for spec in &schema.fields {
            let value = record.get(&spec.name);
            if spec.required && !record.has_value(&spec.name) {
                return Err(AnalysisError::Validation(format!(
                    "{}: missing required field {}",
                    schema.name, spec.name
                )));
            }
            let Some(value) = value else { continue };
            if value.is_null() {
                continue;
            }
            check_field(&schema.name, spec, value)?;
        }
        Ok(())
    }
}

fn check_field(schema: &str, spec: &FieldSpec, value: &Value) -> Result<(), AnalysisError> {
    let fail = |detail: String| {
        Err(AnalysisError::Validation(format!(
            "{schema}: field {}: {detail}",
            spec.name
        )))
    };

    match &spec.field_type {
        FieldType::String => match value.as_str() {
            Some(_) => Ok(()),
            None => fail("expected string".to_string()),
        },
        FieldType::Bool => match value.as_bool() {
            Some(_) => Ok(()),
            None => fail("expected bool".to_string()),
        },
        FieldType::Integer => match value.as_i64() {
            Some(n) if n >= 0 => Ok(()),
            Some(n) => fail(format!("expected non-negative integer, got {n}")),
            None => fail("expected integer".to_string()),
        },
        FieldType::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.iter().any(|a| a == s) => Ok(()),
            Some(s) => fail(format!("value {s:?} not in {allowed:?}")),
            None => fail("expected string enum value".to_string()),
        },
        FieldType::Pattern(pattern) => match value.as_str() {
            Some(s) if pattern_matches(pattern, s) => Ok(()),
            Some(s) => fail(format!("value {s:?} does not match {pattern:?}")),
            None => fail("expected string".to_string()),
        },
    }
}

fn pattern_matches(pattern: &str, value: &str) -> bool {
    match Regex::new(&format!("^(?:{pattern})$")) {
        Ok(re) => re.is_match(value),
        Err(_) => false,
    }
}

fn builtin_schemas() -> Vec<DeviceSchema> {
    vec![
        DeviceSchema {
            name: "ftth_olt".to_string(),
            version: "1.0".to_string(),
            fields: vec![
                FieldSpec::new(
                    "name",
                    FieldType::Pattern(r"OLT\d+[A-Z]{3,4}\d+".to_string()),
                    true,
                    "Unique OLT identifier",
                ),
                FieldSpec::new(
                    "region",
                    FieldType::Enum(
                        ["HOBO", "GENT", "ROES", "ASSE"].map(String::from).to_vec(),
                    ),
                    true,
                    "Geographic region",
                ),
                FieldSpec::new(
                    "environment",
                    FieldType::Enum(
                        ["PRODUCTION", "UAT", "TEST"].map(String::from).to_vec(),
                    ),
                    true,
                    "Deployment environment",
                ),
                FieldSpec::new("esi_name", FieldType::String, false, "Ethernet segment identifier"),
                FieldSpec::new("bandwidth_gbps", FieldType::Integer, false, "Uplink capacity in Gbps"),
                FieldSpec::new("service_count", FieldType::Integer, false, "Active subscriber services"),
                FieldSpec::new("managed_by_inmanta", FieldType::Bool, false, "Under automated configuration management"),
                FieldSpec::new("complete_config", FieldType::Bool, false, "Configuration fully deployed"),
            ],
            intent_keywords: ["ftth", "olt", "fiber", "optical"].map(String::from).to_vec(),
            key_field: "name".to_string(),
            business_context: "Customer-facing fiber aggregation; production changes need a maintenance window".to_string(),
        },
        DeviceSchema {
            name: "lag".to_string(),
            version: "1.0".to_string(),
            fields: vec![
                FieldSpec::new("device_name", FieldType::String, true, "Device hosting the LAG"),
                FieldSpec::new("lag_id", FieldType::Integer, true, "LAG identifier"),
                FieldSpec::new("description", FieldType::String, false, "Human-readable description"),
                FieldSpec::new("admin_key", FieldType::Integer, false, "LACP administrative key"),
            ],
            intent_keywords: ["lag", "link", "aggregation", "lacp"].map(String::from).to_vec(),
            key_field: "lag_id".to_string(),
            business_context: "Aggregated uplinks carrying multiple services; redundancy required".to_string(),
        },
        DeviceSchema {
            name: "mobile_modem".to_string(),
            version: "1.0".to_string(),
            fields: vec![
                FieldSpec::new(
                    "serial_number",
                    FieldType::Pattern(r"LPL\d+[A-Z0-9]+".to_string()),
                    true,
                    "Device serial number",
                ),
                FieldSpec::new("hardware_type", FieldType::String, true, "Hardware model"),
                FieldSpec::new("mobile_subscriber_id", FieldType::String, false, "VPN subscriber identifier"),
                FieldSpec::new(
                    "status",
                    FieldType::Enum(
                        ["CONNECTED", "CONNECTING", "DISCONNECTED", "ERROR"]
                            .map(String::from)
                            .to_vec(),
                    ),
                    false,
                    "Session state",
                ),
                FieldSpec::new("throughput_mbps", FieldType::Integer, false, "Measured throughput"),
                FieldSpec::new("temperature_celsius", FieldType::Integer, false, "Device temperature"),
            ],
            intent_keywords: ["mobile", "modem", "nokia", "5g", "4g"].map(String::from).to_vec(),
            key_field: "serial_number".to_string(),
            business_context: "Mobile connectivity endpoints for VPN subscribers".to_string(),
        },
        DeviceSchema {
            name: "team".to_string(),
            version: "1.0".to_string(),
            fields: vec![
                FieldSpec::new("team_name", FieldType::Pattern(r"[A-Z]+".to_string()), true, "Team identifier, uppercase"),
                FieldSpec::new("team_id", FieldType::String, true, "Unique team identifier"),
                FieldSpec::new("description", FieldType::String, false, "Team responsibilities"),
            ],
            intent_keywords: ["team", "responsible", "contact", "escalation"].map(String::from).to_vec(),
            key_field: "team_name".to_string(),
            business_context: "Operational teams with 24x7 escalation paths".to_string(),
        },
        DeviceSchema {
            name: "pxc".to_string(),
            version: "1.0".to_string(),
            fields: vec![
                FieldSpec::new("device_name", FieldType::String, true, "Device hosting the cross-connect"),
                FieldSpec::new("pxc_id", FieldType::Integer, true, "Cross-connect port identifier"),
                FieldSpec::new("description", FieldType::String, false, "Cross-connect purpose"),
            ],
            intent_keywords: ["pxc", "cross", "connect", "integration"].map(String::from).to_vec(),
            key_field: "pxc_id".to_string(),
            business_context: "Port cross-connects enabling service provisioning between segments".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(schema: &str, value: Value) -> DeviceRecord {
        match value {
            Value::Object(map) => DeviceRecord::new(schema, map),
            _ => panic!("expected object"),
        }
    }

    fn valid_olt() -> DeviceRecord {
        record(
            "ftth_olt",
            json!({
                "name": "OLT17PROP01",
                "region": "HOBO",
                "environment": "PRODUCTION",
                "bandwidth_gbps": 100,
                "service_count": 250,
                "managed_by_inmanta": true,
                "complete_config": true
            }),
        )
    }

    #[test]
    fn builtin_schemas_register_in_order() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let names: Vec<&str> = registry.all().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ftth_olt", "lag", "mobile_modem", "team", "pxc"]);
    }

    #[test]
    fn query_matching_hits_keywords_and_plurals() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let hits = registry.schemas_for_query("show me FTTH OLTs in HOBO");
        assert!(hits.iter().any(|s| s.name == "ftth_olt"));

        let hits = registry.schemas_for_query("which team owns the mobile modems?");
        let names: Vec<&str> = hits.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"mobile_modem"));
        assert!(names.contains(&"team"));
    }

    #[test]
    fn query_matching_falls_back_to_default_pair() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let hits = registry.schemas_for_query("anything interesting happening?");
        let names: Vec<&str> = hits.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ftth_olt", "team"]);
    }

    #[test]
    fn device_name_token_matches_olt_schema() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let hits = registry.schemas_for_query("show me OLT17PROP01");
        assert!(hits.iter().any(|s| s.name == "ftth_olt"));
    }

    #[test]
    fn valid_record_passes_validation() {
        let registry = SchemaRegistry::with_builtin_schemas();
        assert!(registry.validate_record(&valid_olt()).is_ok());
    }

    #[test]
    fn missing_required_field_fails() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let rec = record("ftth_olt", json!({"name": "OLT17PROP01", "region": "HOBO"}));
        let err = registry.validate_record(&rec).unwrap_err();
        assert!(err.to_string().contains("environment"));
    }

    #[test]
    fn enum_and_pattern_violations_fail() {
        let registry = SchemaRegistry::with_builtin_schemas();

        let bad_region = record(
            "ftth_olt",
            json!({"name": "OLT17PROP01", "region": "PARIS", "environment": "TEST"}),
        );
        assert!(registry.validate_record(&bad_region).is_err());

        let bad_name = record(
            "ftth_olt",
            json!({"name": "SWITCH01", "region": "HOBO", "environment": "TEST"}),
        );
        assert!(registry.validate_record(&bad_name).is_err());
    }

    #[test]
    fn negative_integer_fails() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let rec = record(
            "ftth_olt",
            json!({
                "name": "OLT17PROP01", "region": "HOBO", "environment": "TEST",
                "service_count": -3
            }),
        );
        assert!(registry.validate_record(&rec).is_err());
    }

    #[test]
    fn unknown_schema_is_reported() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let rec = record("toaster", json!({"name": "t1"}));
        assert!(matches!(
            registry.validate_record(&rec),
            Err(AnalysisError::UnknownSchema(_))
        ));
    }
}
