use crate::core::value::Value;
use serde::{Serialize, Serializer, ser::SerializeMap};

#[derive(Debug, Clone, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// A flat destination row: ordered column/value pairs for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RowData {
    pub entity: String,
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(entity: &str) -> Self {
        RowData {
            entity: entity.to_string(),
            field_values: Vec::new(),
        }
    }

    /// Sets a column, replacing any previous value for the same name.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.field_values.iter_mut().find(|f| f.name == name) {
            Some(existing) => existing.value = value,
            None => self.field_values.push(FieldValue {
                name: name.to_string(),
                value,
            }),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.field_values
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(field))
    }

    pub fn get_value(&self, field: &str) -> Value {
        self.get(field)
            .map(|f| f.value.clone())
            .unwrap_or(Value::Null)
    }

    pub fn len(&self) -> usize {
        self.field_values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.field_values.is_empty()
    }
}

// Rows travel as plain JSON objects keyed by column name.
impl Serialize for RowData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.field_values.len()))?;
        for field in &self.field_values {
            map.serialize_entry(&field.name, &field.value)?;
        }
        map.end()
    }
}
