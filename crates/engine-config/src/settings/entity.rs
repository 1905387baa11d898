use crate::settings::{BatchSettings, error::SettingsError};
use chrono::{DateTime, TimeDelta, Utc};
use connectors::{erp::Domain, rest::ScopeFilter};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which reshaping a plan applies to its source records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    SalesOrders,
    Customers,
    Products,
    Inventory,
    Suppliers,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::SalesOrders => "sales_orders",
            EntityKind::Customers => "customers",
            EntityKind::Products => "products",
            EntityKind::Inventory => "inventory",
            EntityKind::Suppliers => "suppliers",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How transformed rows reach the destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum WriteMode {
    /// Delete rows matching `scope`, then insert everything.
    ClearInsert { scope: ScopeFilter },
    /// Merge rows on `conflict_column`; nothing is deleted.
    Upsert { conflict_column: String },
}

impl WriteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::ClearInsert { .. } => "clear_insert",
            WriteMode::Upsert { .. } => "upsert",
        }
    }
}

/// Business predicate a source record must pass to be written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RecordRule {
    /// Skip records whose numeric `field` is below zero (returns, refunds).
    ExcludeNegative { field: String },
    /// Skip records where `field` is absent, null or false.
    RequirePresent { field: String },
}

/// One remote collection mapped onto one destination table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPlan {
    pub name: String,
    pub kind: EntityKind,
    pub collection: String,
    #[serde(default)]
    pub filter: Domain,
    pub fields: Vec<String>,
    pub table: String,
    pub write_mode: WriteMode,
    #[serde(default)]
    pub rules: Vec<RecordRule>,
    /// Limit to records whose `window_field` lies within the last N days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
    #[serde(default = "default_window_field")]
    pub window_field: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_batch_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_batch_size: Option<usize>,
}

fn default_window_field() -> String {
    "date_order".to_string()
}

const ERP_DATETIME: &str = "%Y-%m-%d %H:%M:%S";

/// Longest accepted date window, roughly a century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

impl EntityPlan {
    /// Search filter including the date window, if any, relative to `now`.
    pub fn effective_filter(&self, now: DateTime<Utc>) -> Result<Domain, SettingsError> {
        let Some(days) = self.window_days else {
            return Ok(self.filter.clone());
        };

        let window_start = TimeDelta::try_days(i64::from(days))
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| SettingsError::InvalidPlan {
                entity: self.name.clone(),
                reason: format!("window of {days} days reaches before the earliest date"),
            })?;

        let start = window_start
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|d| d.format(ERP_DATETIME).to_string());
        let end = now
            .date_naive()
            .and_hms_opt(23, 59, 59)
            .map(|d| d.format(ERP_DATETIME).to_string());

        let mut filter = self.filter.clone();
        if let (Some(start), Some(end)) = (start, end) {
            filter = filter
                .condition(&self.window_field, ">=", start)
                .condition(&self.window_field, "<=", end);
        }
        Ok(filter)
    }

    /// Batch sizes for this plan; the detail-read size never exceeds the
    /// identifier page size.
    pub fn batches(&self, defaults: &BatchSettings) -> BatchSettings {
        let page_size = self.page_size.unwrap_or(defaults.page_size);
        let read_batch_size = self
            .read_batch_size
            .unwrap_or(defaults.read_batch_size)
            .min(page_size);
        BatchSettings {
            page_size,
            read_batch_size,
            insert_batch_size: self.insert_batch_size.unwrap_or(defaults.insert_batch_size),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |reason: &str| SettingsError::InvalidPlan {
            entity: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if self.collection.trim().is_empty() {
            return Err(invalid("collection is empty"));
        }
        if self.table.trim().is_empty() {
            return Err(invalid("table is empty"));
        }
        if self.fields.is_empty() {
            return Err(invalid("field list is empty"));
        }
        if [self.page_size, self.read_batch_size, self.insert_batch_size]
            .iter()
            .any(|size| *size == Some(0))
        {
            return Err(invalid("batch sizes must be positive"));
        }
        if let WriteMode::Upsert { conflict_column } = &self.write_mode
            && conflict_column.trim().is_empty()
        {
            return Err(invalid("upsert needs a conflict column"));
        }
        if self.window_days.is_some_and(|days| days > MAX_WINDOW_DAYS) {
            return Err(invalid(&format!(
                "window_days must not exceed {MAX_WINDOW_DAYS}"
            )));
        }

        Ok(())
    }
}
