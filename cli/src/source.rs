//! Network data source port and the static adapter.
//!
//! The fetch contract takes an untyped filter map with the reserved keys
//! `region`, `environment`, `name_prefix`, and `name_equals`; unknown keys
//! are ignored. Records are validated against the schema registry once at
//! this boundary, so everything downstream sees conforming records only.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use netrag_analysis::SchemaRegistry;
use netrag_core::{DeviceRecord, NetragError};

/// Read access to live device records, one collection per schema.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch up to `limit` records for a schema, filtered.
    async fn fetch(
        &self,
        schema_name: &str,
        filters: &Map<String, Value>,
        limit: usize,
    ) -> Result<Vec<DeviceRecord>, NetragError>;

    /// When the source last generated its data. Drives the freshness score.
    fn generated_at(&self) -> DateTime<Utc>;
}

/// In-memory data source backed by a fixed record set.
///
/// Serves as the mock backend for local runs and tests; the production
/// adapter implementing the same trait lives outside this repository.
pub struct StaticDataSource {
    records: Vec<DeviceRecord>,
    generated_at: DateTime<Utc>,
}

impl StaticDataSource {
    /// Build from records, validating each against the registry. Invalid
    /// records are dropped with a warning rather than poisoning downstream
    /// analysis.
    pub fn new(records: Vec<DeviceRecord>, registry: &SchemaRegistry) -> Self {
        let records = records
            .into_iter()
            .filter(|record| match registry.validate_record(record) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("dropping invalid record {}: {e}", record.display_name());
                    false
                }
            })
            .collect();
        Self {
            records,
            generated_at: Utc::now(),
        }
    }

    /// Override the reported generation time (used to exercise freshness
    /// decay).
    pub fn with_generated_at(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Load records from a JSON file: an array of objects each carrying a
    /// `schema_name` plus its fields.
    pub fn from_json_file(path: &Path, registry: &SchemaRegistry) -> Result<Self, NetragError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| NetragError::upstream("data source", e.to_string()))?;
        let rows: Vec<Value> = serde_json::from_str(&text)
            .map_err(|e| NetragError::Validation(format!("bad data file: {e}")))?;

        let mut records = Vec::new();
        for row in rows {
            let Value::Object(mut fields) = row else {
                return Err(NetragError::Validation(
                    "data file rows must be objects".to_string(),
                ));
            };
            let schema_name = match fields.remove("schema_name") {
                Some(Value::String(name)) => name,
                _ => {
                    return Err(NetragError::Validation(
                        "data file rows need a schema_name".to_string(),
                    ))
                }
            };
            records.push(DeviceRecord::new(schema_name, fields));
        }
        Ok(Self::new(records, registry))
    }

    /// A small believable fleet used when no data file is configured.
    pub fn demo(registry: &SchemaRegistry) -> Self {
        let rows = vec![
            olt("OLT17PROP01", "HOBO", "PRODUCTION", 100, 250, true, true),
            olt("OLT18PROP02", "HOBO", "PRODUCTION", 100, 180, true, true),
            olt("OLT70AALS01", "GENT", "PRODUCTION", 400, 520, true, true),
            olt("OLT71AALS02", "GENT", "PRODUCTION", 10, 0, true, false),
            olt("OLT33ROES01", "ROES", "UAT", 100, 45, false, true),
            olt("OLT34ASSE01", "ASSE", "UAT", 10, 12, true, true),
            olt("OLT35ASSE02", "ASSE", "TEST", 10, 3, false, false),
            modem("LPL2408001DF", "Nokia 5G26-A", "CONNECTED", 120, 45),
            modem("LPL24080006F", "Nokia 5G26-A", "DISCONNECTED", 0, 38),
            team("NAS", "team-nas-01"),
            team("IPOPS", "team-ipops-01"),
            team("MOBILE", "team-mobile-01"),
            lag("CINAALSA01", 10, "uplink to BNG", 32768),
            lag("SRPTRO01", 20, "core interconnect", 32769),
            pxc("CINAALSA01", 3, "service stitching"),
        ];
        Self::new(rows, registry)
    }
}

#[async_trait]
impl DataSource for StaticDataSource {
    async fn fetch(
        &self,
        schema_name: &str,
        filters: &Map<String, Value>,
        limit: usize,
    ) -> Result<Vec<DeviceRecord>, NetragError> {
        let matches: Vec<DeviceRecord> = self
            .records
            .iter()
            .filter(|r| r.schema_name == schema_name)
            .filter(|r| matches_filters(r, filters))
            .take(limit)
            .cloned()
            .collect();
        Ok(matches)
    }

    fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }
}

fn matches_filters(record: &DeviceRecord, filters: &Map<String, Value>) -> bool {
    for (key, value) in filters {
        let Some(wanted) = value.as_str() else {
            continue;
        };
        let holds = match key.as_str() {
            "region" => record.str_field("region") == Some(wanted),
            "environment" => record.str_field("environment") == Some(wanted),
            "name_equals" => record.display_name() == wanted,
            "name_prefix" => record.display_name().starts_with(wanted),
            // Unknown keys are ignored by contract.
            _ => true,
        };
        if !holds {
            return false;
        }
    }
    true
}

fn olt(
    name: &str,
    region: &str,
    environment: &str,
    bandwidth: i64,
    services: i64,
    managed: bool,
    complete: bool,
) -> DeviceRecord {
    record(
        "ftth_olt",
        json!({
            "name": name,
            "region": region,
            "environment": environment,
            "bandwidth_gbps": bandwidth,
            "service_count": services,
            "managed_by_inmanta": managed,
            "complete_config": complete,
            "esi_name": format!("esi-{}", name.to_lowercase())
        }),
    )
}

fn modem(serial: &str, hardware: &str, status: &str, throughput: i64, temp: i64) -> DeviceRecord {
    record(
        "mobile_modem",
        json!({
            "serial_number": serial,
            "hardware_type": hardware,
            "status": status,
            "throughput_mbps": throughput,
            "temperature_celsius": temp,
            "mobile_subscriber_id": format!("MOBILE-SUB-VPN-{serial}")
        }),
    )
}

fn team(name: &str, id: &str) -> DeviceRecord {
    record("team", json!({"team_name": name, "team_id": id}))
}

fn lag(device: &str, lag_id: i64, description: &str, admin_key: i64) -> DeviceRecord {
    record(
        "lag",
        json!({
            "device_name": device,
            "lag_id": lag_id,
            "description": description,
            "admin_key": admin_key
        }),
    )
}

fn pxc(device: &str, pxc_id: i64, description: &str) -> DeviceRecord {
    record(
        "pxc",
        json!({"device_name": device, "pxc_id": pxc_id, "description": description}),
    )
}

fn record(schema: &str, value: Value) -> DeviceRecord {
    match value {
        Value::Object(map) => DeviceRecord::new(schema, map),
        _ => unreachable!("record literals are objects"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> StaticDataSource {
        StaticDataSource::demo(&SchemaRegistry::with_builtin_schemas())
    }

    #[tokio::test]
    async fn fetch_filters_by_region_and_environment() {
        let s = source();
        let mut filters = Map::new();
        filters.insert("region".to_string(), json!("HOBO"));
        let hobo = s.fetch("ftth_olt", &filters, 50).await.unwrap();
        assert_eq!(hobo.len(), 2);
        assert!(hobo.iter().all(|r| r.str_field("region") == Some("HOBO")));

        filters.insert("environment".to_string(), json!("PRODUCTION"));
        let hobo_prod = s.fetch("ftth_olt", &filters, 50).await.unwrap();
        assert_eq!(hobo_prod.len(), 2);
    }

    #[tokio::test]
    async fn fetch_by_exact_name() {
        let s = source();
        let mut filters = Map::new();
        filters.insert("name_equals".to_string(), json!("OLT17PROP01"));
        let hit = s.fetch("ftth_olt", &filters, 50).await.unwrap();
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].display_name(), "OLT17PROP01");
    }

    #[tokio::test]
    async fn unknown_filter_keys_are_ignored() {
        let s = source();
        let mut filters = Map::new();
        filters.insert("favourite_colour".to_string(), json!("blue"));
        let all = s.fetch("ftth_olt", &filters, 50).await.unwrap();
        assert_eq!(all.len(), 7);
    }

    #[tokio::test]
    async fn limit_truncates() {
        let s = source();
        let some = s.fetch("ftth_olt", &Map::new(), 3).await.unwrap();
        assert_eq!(some.len(), 3);
    }

    #[test]
    fn invalid_records_are_dropped_at_the_boundary() {
        let registry = SchemaRegistry::with_builtin_schemas();
        let bad = record(
            "ftth_olt",
            json!({"name": "NOT-AN-OLT", "region": "HOBO", "environment": "TEST"}),
        );
        let good = record(
            "ftth_olt",
            json!({"name": "OLT17PROP01", "region": "HOBO", "environment": "TEST"}),
        );
        let source = StaticDataSource::new(vec![bad, good], &registry);
        assert_eq!(source.records.len(), 1);
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("devices.json");
        std::fs::write(
            &path,
            r#"[{"schema_name": "team", "team_name": "NAS", "team_id": "t-1"}]"#,
        )
        .unwrap();

        let registry = SchemaRegistry::with_builtin_schemas();
        let source = StaticDataSource::from_json_file(&path, &registry).unwrap();
        assert_eq!(source.records.len(), 1);
        assert_eq!(source.records[0].schema_name, "team");
    }
}
