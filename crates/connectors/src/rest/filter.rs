use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl FilterOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
        }
    }
}

/// Row filter used to scope a delete, rendered as `column=op.value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeFilter {
    pub column: String,
    pub op: FilterOp,
    pub value: String,
}

impl ScopeFilter {
    pub fn new(column: &str, op: FilterOp, value: impl ToString) -> Self {
        ScopeFilter {
            column: column.to_string(),
            op,
            value: value.to_string(),
        }
    }

    /// Matches every row whose `column` is never equal to `0`.
    ///
    /// The REST store refuses unfiltered deletes, so a full clear needs a
    /// predicate that holds for every row.
    pub fn all_rows(column: &str) -> Self {
        ScopeFilter::new(column, FilterOp::Neq, 0)
    }

    pub fn to_query(&self) -> (String, String) {
        (
            self.column.clone(),
            format!("{}.{}", self.op.as_str(), self.value),
        )
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}.{}", self.column, self.op.as_str(), self.value)
    }
}
