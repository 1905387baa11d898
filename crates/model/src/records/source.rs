use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A record as returned by the ERP `read` call.
///
/// The ERP encodes "no value" as `false`, and many-to-one relations as an
/// `[id, display_name]` pair. The accessors here normalize both conventions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceRecord {
    fields: Map<String, JsonValue>,
}

impl SourceRecord {
    pub fn new(fields: Map<String, JsonValue>) -> Self {
        SourceRecord { fields }
    }

    pub fn id(&self) -> Option<i64> {
        self.fields.get("id").and_then(JsonValue::as_i64)
    }

    /// Returns the field unless it is absent, `null` or the ERP's `false`.
    pub fn present(&self, field: &str) -> Option<&JsonValue> {
        match self.fields.get(field) {
            None | Some(JsonValue::Null) | Some(JsonValue::Bool(false)) => None,
            Some(value) => Some(value),
        }
    }

    /// Non-empty string value.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.present(field)
            .and_then(JsonValue::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn get_f64(&self, field: &str) -> Option<f64> {
        match self.present(field)? {
            JsonValue::Number(n) => n.as_f64(),
            JsonValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Identifier half of a many-to-one value.
    pub fn relation_id(&self, field: &str) -> Option<i64> {
        match self.present(field)? {
            JsonValue::Array(pair) => pair.first().and_then(JsonValue::as_i64),
            JsonValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    /// Display-name half of a many-to-one value.
    pub fn relation_label(&self, field: &str) -> Option<&str> {
        match self.present(field)? {
            JsonValue::Array(pair) => pair
                .get(1)
                .and_then(JsonValue::as_str)
                .filter(|s| !s.trim().is_empty()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, JsonValue>> for SourceRecord {
    fn from(fields: Map<String, JsonValue>) -> Self {
        SourceRecord::new(fields)
    }
}
