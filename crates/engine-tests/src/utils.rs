use async_trait::async_trait;
use connectors::{
    erp::{Authenticator, Domain, RemoteReader},
    error::ConnectorError,
    rest::{FilterOp, ScopeFilter, TableStore},
};
use engine_config::settings::{BatchSettings, defaults::default_plans, entity::EntityPlan};
use engine_core::retry::RetryPolicy;
use engine_runtime::executor::SyncExecutor;
use model::{
    core::value::Value,
    records::{row::RowData, source::SourceRecord},
};
use serde_json::{Value as JsonValue, json};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

/// A remote call observed by [`FakeErp`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErpCall {
    Login,
    Count { collection: String },
    Search { collection: String, offset: u64, limit: usize },
    Read { collection: String, ids: usize },
}

/// How an injected ERP failure presents itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Failure {
    /// HTTP 503; retried, then reported as a transport failure.
    Unavailable,
    /// Session rejected.
    Auth,
}

impl Failure {
    fn error(self) -> ConnectorError {
        match self {
            Failure::Unavailable => ConnectorError::Status {
                status: 503,
                body: "service unavailable".into(),
            },
            Failure::Auth => ConnectorError::Auth("session expired".into()),
        }
    }
}

#[derive(Default)]
struct ErpState {
    collections: HashMap<String, Vec<SourceRecord>>,
    calls: Vec<ErpCall>,
    reject_login: bool,
    fail_count: HashMap<String, Failure>,
    fail_read: HashMap<String, Failure>,
    strip_id: HashMap<String, i64>,
}

/// In-memory ERP. Filters are ignored: every record of a collection matches.
/// Identifiers are served in ascending order; detail reads answer in reverse.
#[derive(Clone, Default)]
pub struct FakeErp {
    state: Arc<Mutex<ErpState>>,
}

impl FakeErp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(self, collection: &str, records: Vec<JsonValue>) -> Self {
        let mut records: Vec<SourceRecord> = records
            .into_iter()
            .map(|r| serde_json::from_value(r).unwrap())
            .collect();
        records.sort_by_key(|r| r.id());
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), records);
        self
    }

    pub fn reject_login(self) -> Self {
        self.state.lock().unwrap().reject_login = true;
        self
    }

    pub fn fail_count(self, collection: &str, failure: Failure) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_count
            .insert(collection.to_string(), failure);
        self
    }

    pub fn fail_read(self, collection: &str, failure: Failure) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_read
            .insert(collection.to_string(), failure);
        self
    }

    /// Serve record `id` from detail reads with its `id` field removed.
    pub fn strip_id_on_read(self, collection: &str, id: i64) -> Self {
        self.state
            .lock()
            .unwrap()
            .strip_id
            .insert(collection.to_string(), id);
        self
    }

    pub fn calls(&self) -> Vec<ErpCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn searches(&self, collection: &str) -> Vec<(u64, usize)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ErpCall::Search {
                    collection: c,
                    offset,
                    limit,
                } if c == collection => Some((offset, limit)),
                _ => None,
            })
            .collect()
    }

    pub fn reads(&self, collection: &str) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                ErpCall::Read { collection: c, ids } if c == collection => Some(ids),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Authenticator for FakeErp {
    async fn authenticate(&self) -> Result<Arc<dyn RemoteReader>, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ErpCall::Login);
        if state.reject_login {
            return Err(ConnectorError::Auth(
                "ERP rejected credentials for user 'sync@example.com'".into(),
            ));
        }
        Ok(Arc::new(self.clone()))
    }
}

#[async_trait]
impl RemoteReader for FakeErp {
    async fn count(&self, collection: &str, _: &Domain) -> Result<u64, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ErpCall::Count {
            collection: collection.to_string(),
        });
        if let Some(failure) = state.fail_count.get(collection) {
            return Err(failure.error());
        }
        Ok(state.collections.get(collection).map_or(0, Vec::len) as u64)
    }

    async fn fetch_identifiers(
        &self,
        collection: &str,
        _: &Domain,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<i64>, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ErpCall::Search {
            collection: collection.to_string(),
            offset,
            limit,
        });
        Ok(state
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter_map(SourceRecord::id)
                    .skip(offset as usize)
                    .take(limit)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_records(
        &self,
        collection: &str,
        ids: &[i64],
        _: &[String],
    ) -> Result<Vec<SourceRecord>, ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ErpCall::Read {
            collection: collection.to_string(),
            ids: ids.len(),
        });
        if let Some(failure) = state.fail_read.get(collection) {
            return Err(failure.error());
        }
        let records = state.collections.get(collection).cloned().unwrap_or_default();
        let strip = state.strip_id.get(collection).copied();
        Ok(records
            .into_iter()
            .rev()
            .filter(|r| r.id().is_some_and(|id| ids.contains(&id)))
            .map(|r| match strip {
                Some(id) if r.id() == Some(id) => without_id(&r),
                _ => r,
            })
            .collect())
    }
}

fn without_id(record: &SourceRecord) -> SourceRecord {
    let mut value = serde_json::to_value(record).unwrap();
    if let Some(fields) = value.as_object_mut() {
        fields.remove("id");
    }
    serde_json::from_value(value).unwrap()
}

/// A write observed by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Clear { table: String, scope: String },
    Insert { table: String, rows: usize },
    Upsert { table: String, rows: usize, conflict: String },
}

#[derive(Default)]
struct StoreState {
    tables: HashMap<String, Vec<RowData>>,
    calls: Vec<StoreCall>,
    /// Table -> 1-based insert number that fails.
    fail_insert: HashMap<String, usize>,
    inserts: HashMap<String, usize>,
}

/// In-memory REST store. Accepted batches are committed immediately.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(self, table: &str, rows: Vec<RowData>) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(table.to_string(), rows);
        self
    }

    pub fn fail_insert(self, table: &str, nth: usize) -> Self {
        self.state
            .lock()
            .unwrap()
            .fail_insert
            .insert(table.to_string(), nth);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn rows(&self, table: &str) -> Vec<RowData> {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, table: &str) -> usize {
        self.rows(table).len()
    }
}

fn scope_matches(scope: &ScopeFilter, value: &Value) -> bool {
    let text = value.to_string();
    match scope.op {
        FilterOp::Eq => text == scope.value,
        FilterOp::Neq => text != scope.value,
        op => {
            let (Some(left), Ok(right)) = (value.as_f64(), scope.value.parse::<f64>()) else {
                return false;
            };
            match op {
                FilterOp::Gt => left > right,
                FilterOp::Gte => left >= right,
                FilterOp::Lt => left < right,
                _ => left <= right,
            }
        }
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn clear(&self, table: &str, scope: &ScopeFilter) -> Result<(), ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Clear {
            table: table.to_string(),
            scope: scope.to_string(),
        });
        if let Some(rows) = state.tables.get_mut(table) {
            rows.retain(|row| !scope_matches(scope, &row.get_value(&scope.column)));
        }
        Ok(())
    }

    async fn insert(&self, table: &str, rows: &[RowData]) -> Result<(), ConnectorError> {
        let mut state = self.state.lock().unwrap();
        let nth = {
            let n = state.inserts.entry(table.to_string()).or_default();
            *n += 1;
            *n
        };
        if state.fail_insert.get(table) == Some(&nth) {
            return Err(ConnectorError::Status {
                status: 400,
                body: json!({"code": "22P02", "message": "invalid input syntax"}).to_string(),
            });
        }
        state.calls.push(StoreCall::Insert {
            table: table.to_string(),
            rows: rows.len(),
        });
        state
            .tables
            .entry(table.to_string())
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }

    async fn upsert(
        &self,
        table: &str,
        rows: &[RowData],
        conflict_column: &str,
    ) -> Result<(), ConnectorError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(StoreCall::Upsert {
            table: table.to_string(),
            rows: rows.len(),
            conflict: conflict_column.to_string(),
        });
        let existing = state.tables.entry(table.to_string()).or_default();
        for row in rows {
            let key = row.get_value(conflict_column);
            match existing
                .iter_mut()
                .find(|r| r.get_value(conflict_column) == key)
            {
                Some(current) => *current = row.clone(),
                None => existing.push(row.clone()),
            }
        }
        Ok(())
    }

    async fn row_count(&self, table: &str) -> Result<u64, ConnectorError> {
        Ok(self.count(table) as u64)
    }
}

/// Built-in plan for `name`.
pub fn plan(name: &str) -> EntityPlan {
    default_plans()
        .into_iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("no built-in plan named {name}"))
}

pub fn batches(page_size: usize, read_batch_size: usize, insert_batch_size: usize) -> BatchSettings {
    BatchSettings {
        page_size,
        read_batch_size,
        insert_batch_size,
    }
}

/// Three attempts, no backoff.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO, Duration::ZERO)
}

pub fn executor(erp: &FakeErp, store: &MemoryStore, batch: BatchSettings) -> SyncExecutor {
    SyncExecutor::new(
        Arc::new(erp.clone()),
        Arc::new(store.clone()),
        batch,
        fast_retry(),
    )
}

pub fn orders(n: i64) -> Vec<JsonValue> {
    (1..=n)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("POS/{id:05}"),
                "partner_id": [100 + id % 7, format!("Pharmacy {}", id % 7)],
                "date_order": "2026-10-17 09:00:00",
                "amount_total": 10.0 + id as f64,
                "amount_untaxed": 9.0 + id as f64,
                "state": "paid"
            })
        })
        .collect()
}

pub fn partners(n: i64) -> Vec<JsonValue> {
    (1..=n)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Partner {id}"),
                "email": format!("partner{id}@example.com"),
                "phone": false,
                "mobile": "+962790000000",
                "city": "Amman",
                "country_id": [110, "Jordan"]
            })
        })
        .collect()
}

pub fn products(n: i64) -> Vec<JsonValue> {
    (1..=n)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Product {id}"),
                "default_code": format!("SKU-{id}"),
                "list_price": 4.5,
                "standard_price": 3.0,
                "categ_id": [1, "Medicines"],
                "qty_available": 12
            })
        })
        .collect()
}
