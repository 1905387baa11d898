use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// One term of an ERP search domain: either a `[field, operator, value]`
/// condition or a prefix logical operator (`"|"`, `"&"`, `"!"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainTerm {
    Condition(String, String, JsonValue),
    Operator(String),
}

/// ERP search filter. An empty domain matches every record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(pub Vec<DomainTerm>);

impl Domain {
    pub fn all() -> Self {
        Domain(Vec::new())
    }

    pub fn condition(mut self, field: &str, op: &str, value: impl Into<JsonValue>) -> Self {
        self.0.push(DomainTerm::Condition(
            field.to_string(),
            op.to_string(),
            value.into(),
        ));
        self
    }

    /// Appends the terms of `other`; consecutive conditions are implicitly AND-ed.
    pub fn and(mut self, other: Domain) -> Self {
        self.0.extend(other.0);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
