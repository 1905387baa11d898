use crate::settings::{entity::EntityPlan, error::SettingsError};
use connectors::{
    erp::{Credentials, ErpConfig},
    rest::StoreConfig,
};
use engine_core::retry::RetryPolicy;
use std::{collections::HashMap, path::Path, str::FromStr, time::Duration};
use tracing::{debug, info};

pub mod defaults;
pub mod entity;
pub mod error;

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_READ_BATCH_SIZE: usize = 500;
pub const DEFAULT_INSERT_BATCH_SIZE: usize = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSettings {
    /// Identifiers requested per search call.
    pub page_size: usize,
    /// Identifiers per detail read.
    pub read_batch_size: usize,
    /// Rows per insert or upsert request.
    pub insert_batch_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            read_batch_size: DEFAULT_READ_BATCH_SIZE,
            insert_batch_size: DEFAULT_INSERT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErpSettings {
    pub config: ErpConfig,
    pub credentials: Credentials,
}

impl ErpSettings {
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let timeout = parse_or(vars, "ODOO_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let config = ErpConfig::new(required(vars, "ODOO_URL")?, required(vars, "ODOO_DB")?)
            .with_timeout(Duration::from_secs(timeout));
        let credentials = Credentials::new(
            required(vars, "ODOO_USERNAME")?,
            required(vars, "ODOO_PASSWORD")?,
        );
        Ok(Self {
            config,
            credentials,
        })
    }
}

pub fn store_from_vars(vars: &HashMap<String, String>) -> Result<StoreConfig, SettingsError> {
    let timeout = parse_or(vars, "SUPABASE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
    Ok(
        StoreConfig::new(required(vars, "SUPABASE_URL")?, required(vars, "SUPABASE_KEY")?)
            .with_timeout(Duration::from_secs(timeout)),
    )
}

/// Everything a run needs, resolved from environment variables and an
/// optional plan file.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub erp: ErpSettings,
    pub store: StoreConfig,
    pub batch: BatchSettings,
    pub retry: RetryPolicy,
    pub entities: Vec<EntityPlan>,
}

impl SyncSettings {
    /// Builds settings with the built-in entity plans.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let settings = Self {
            erp: ErpSettings::from_vars(vars)?,
            store: store_from_vars(vars)?,
            batch: batch_from_vars(vars)?,
            retry: retry_from_vars(vars)?,
            entities: defaults::default_plans(),
        };
        debug!(
            erp = %settings.erp.config.url,
            store = %settings.store.url,
            entities = settings.entities.len(),
            "Settings resolved"
        );
        Ok(settings)
    }

    /// Replaces the entity plans with those read from a JSON file.
    pub fn with_plans_from(mut self, path: &Path) -> Result<Self, SettingsError> {
        self.entities = load_plans(path)?;
        Ok(self)
    }

    /// Restricts the run to the named entities, keeping plan order.
    /// An empty selection keeps every plan.
    pub fn select(mut self, names: &[String]) -> Result<Self, SettingsError> {
        self.entities = select_plans(self.entities, names)?;
        Ok(self)
    }
}

/// Keeps the plans named in `names`, in plan order. Empty `names` keeps all.
pub fn select_plans(
    mut plans: Vec<EntityPlan>,
    names: &[String],
) -> Result<Vec<EntityPlan>, SettingsError> {
    if names.is_empty() {
        return Ok(plans);
    }
    if let Some(unknown) = names.iter().find(|n| !plans.iter().any(|p| &p.name == *n)) {
        return Err(SettingsError::UnknownEntity(unknown.clone()));
    }
    plans.retain(|p| names.contains(&p.name));
    Ok(plans)
}

/// Reads a JSON array of entity plans and validates each one.
pub fn load_plans(path: &Path) -> Result<Vec<EntityPlan>, SettingsError> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::PlanRead {
        path: path.display().to_string(),
        source,
    })?;
    let plans: Vec<EntityPlan> =
        serde_json::from_str(&content).map_err(|source| SettingsError::PlanParse {
            path: path.display().to_string(),
            source,
        })?;

    let mut seen = std::collections::HashSet::new();
    for plan in &plans {
        plan.validate()?;
        if !seen.insert(plan.name.as_str()) {
            return Err(SettingsError::InvalidPlan {
                entity: plan.name.clone(),
                reason: "duplicate entity name".to_string(),
            });
        }
    }

    info!(path = %path.display(), entities = plans.len(), "Loaded entity plans");
    Ok(plans)
}

fn batch_from_vars(vars: &HashMap<String, String>) -> Result<BatchSettings, SettingsError> {
    let page_size = positive(vars, "SYNC_PAGE_SIZE", DEFAULT_PAGE_SIZE)?;
    let read_batch_size = positive(vars, "SYNC_READ_BATCH_SIZE", DEFAULT_READ_BATCH_SIZE)?;
    Ok(BatchSettings {
        page_size,
        read_batch_size: read_batch_size.min(page_size),
        insert_batch_size: positive(vars, "SYNC_INSERT_BATCH_SIZE", DEFAULT_INSERT_BATCH_SIZE)?,
    })
}

fn retry_from_vars(vars: &HashMap<String, String>) -> Result<RetryPolicy, SettingsError> {
    let defaults = RetryPolicy::default();
    let attempts = positive(vars, "SYNC_RETRY_ATTEMPTS", defaults.max_attempts)?;
    let base_ms = parse_or(
        vars,
        "SYNC_RETRY_BASE_MS",
        defaults.base_delay.as_millis() as u64,
    )?;
    let max_ms = parse_or(
        vars,
        "SYNC_RETRY_MAX_MS",
        defaults.max_delay.as_millis() as u64,
    )?;
    Ok(RetryPolicy::new(
        attempts,
        Duration::from_millis(base_ms),
        Duration::from_millis(max_ms),
    ))
}

fn required<'a>(vars: &'a HashMap<String, String>, key: &str) -> Result<&'a str, SettingsError> {
    vars.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| SettingsError::Missing(key.to_string()))
}

fn parse_or<T>(vars: &HashMap<String, String>, key: &str, default: T) -> Result<T, SettingsError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| SettingsError::Invalid {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn positive(
    vars: &HashMap<String, String>,
    key: &str,
    default: usize,
) -> Result<usize, SettingsError> {
    let value = parse_or(vars, key, default)?;
    if value == 0 {
        return Err(SettingsError::Invalid {
            key: key.to_string(),
            value: "0".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
