use serde::{Deserialize, Serialize};

/// Semantic type of a schema field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Bool,
    Integer,
    /// Closed set of allowed string values.
    Enum(Vec<String>),
    /// Regex the string value must match in full.
    Pattern(String),
}

/// One field of a device schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    /// Required fields feed the completeness score and record validation.
    pub required: bool,
    pub description: String,
}

impl FieldSpec {
    pub fn new(
        name: &str,
        field_type: FieldType,
        required: bool,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            required,
            description: description.to_string(),
        }
    }
}

/// Declarative description of a device record shape.
///
/// Schemas are registered once at startup and read-only afterwards. The
/// intent keywords connect free-text queries to schemas; the key field
/// identifies a record for dedup and consistency checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSchema {
    pub name: String,
    pub version: String,
    pub fields: Vec<FieldSpec>,
    /// Lowercase tokens that map a query onto this schema.
    pub intent_keywords: Vec<String>,
    /// Field used to identify a record (e.g. `name`, `serial_number`).
    pub key_field: String,
    /// One-line operational context rendered into LLM summaries.
    pub business_context: String,
}

impl DeviceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    /// Whether any intent keyword appears among the query tokens.
    pub fn matches_query(&self, query_tokens: &[&str]) -> bool {
        self.intent_keywords
            .iter()
            .any(|kw| query_tokens.contains(&kw.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> DeviceSchema {
        DeviceSchema {
            name: "ftth_olt".to_string(),
            version: "1.0".to_string(),
            fields: vec![
                FieldSpec::new("name", FieldType::Pattern(r"OLT\d+[A-Z]{3,4}\d+".into()), true, "OLT identifier"),
                FieldSpec::new("region", FieldType::Enum(vec!["HOBO".into(), "GENT".into()]), true, "Region"),
                FieldSpec::new("service_count", FieldType::Integer, false, "Active services"),
            ],
            intent_keywords: vec!["ftth".into(), "olt".into(), "fiber".into()],
            key_field: "name".to_string(),
            business_context: "Customer-facing fiber aggregation".to_string(),
        }
    }

    #[test]
    fn field_lookup() {
        let s = schema();
        assert!(s.field("region").is_some());
        assert!(s.field("bogus").is_none());
        assert_eq!(s.required_fields().count(), 2);
    }

    #[test]
    fn matches_query_on_keyword_intersection() {
        let s = schema();
        assert!(s.matches_query(&["show", "me", "ftth", "devices"]));
        assert!(!s.matches_query(&["mobile", "modems"]));
    }
}
