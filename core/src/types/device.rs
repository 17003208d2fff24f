use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A device record fetched from the network data source.
///
/// Records are schema-tagged maps: the fields are untyped JSON, but every
/// record is validated against its [`crate::types::schema::DeviceSchema`]
/// once at the data-source boundary, so downstream code can rely on declared
/// enum values and non-negative numerics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Name of the schema this record conforms to (e.g. `ftth_olt`).
    pub schema_name: String,
    /// Field map, keyed by the schema's field names.
    pub fields: Map<String, Value>,
}

impl DeviceRecord {
    pub fn new(schema_name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            schema_name: schema_name.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field as a string, `None` when absent or not a string.
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Field as a signed integer, `None` when absent or not numeric.
    pub fn int_field(&self, field: &str) -> Option<i64> {
        self.fields.get(field).and_then(Value::as_i64)
    }

    /// Field as a bool, `None` when absent or not a bool.
    pub fn bool_field(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// True when the field is present and neither null nor an empty string.
    pub fn has_value(&self, field: &str) -> bool {
        match self.fields.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(_) => true,
        }
    }

    /// The record's display name: `name`, falling back to the common key
    /// fields of the other schemas.
    pub fn display_name(&self) -> &str {
        for key in ["name", "device_name", "serial_number", "team_name"] {
            if let Some(v) = self.str_field(key) {
                return v;
            }
        }
        "<unnamed>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn olt() -> DeviceRecord {
        let fields = match json!({
            "name": "OLT17PROP01",
            "region": "HOBO",
            "environment": "PRODUCTION",
            "bandwidth_gbps": 100,
            "service_count": 250,
            "managed_by_inmanta": true,
            "complete_config": true,
            "esi_name": ""
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        DeviceRecord::new("ftth_olt", fields)
    }

    #[test]
    fn typed_accessors() {
        let d = olt();
        assert_eq!(d.str_field("region"), Some("HOBO"));
        assert_eq!(d.int_field("service_count"), Some(250));
        assert_eq!(d.bool_field("managed_by_inmanta"), Some(true));
        assert_eq!(d.str_field("service_count"), None);
        assert_eq!(d.int_field("missing"), None);
    }

    #[test]
    fn has_value_treats_empty_string_as_absent() {
        let d = olt();
        assert!(d.has_value("name"));
        assert!(!d.has_value("esi_name"));
        assert!(!d.has_value("nonexistent"));
    }

    #[test]
    fn display_name_falls_through_key_fields() {
        let d = olt();
        assert_eq!(d.display_name(), "OLT17PROP01");

        let mut fields = Map::new();
        fields.insert("serial_number".into(), Value::String("LPL2408001DF".into()));
        let modem = DeviceRecord::new("mobile_modem", fields);
        assert_eq!(modem.display_name(), "LPL2408001DF");
    }
}
