use crate::error::ConnectorError;
use async_trait::async_trait;
use model::records::row::RowData;

pub mod client;
pub mod config;
pub mod filter;

pub use client::RestClient;
pub use config::StoreConfig;
pub use filter::{FilterOp, ScopeFilter};

/// Table-oriented destination with delete/insert/upsert verbs.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Deletes every row of `table` matching `scope`.
    async fn clear(&self, table: &str, scope: &ScopeFilter) -> Result<(), ConnectorError>;

    /// Inserts `rows` in a single request.
    async fn insert(&self, table: &str, rows: &[RowData]) -> Result<(), ConnectorError>;

    /// Inserts `rows`, merging into existing rows that share `conflict_column`.
    async fn upsert(
        &self,
        table: &str,
        rows: &[RowData],
        conflict_column: &str,
    ) -> Result<(), ConnectorError>;

    /// Exact number of rows currently in `table`.
    async fn row_count(&self, table: &str) -> Result<u64, ConnectorError>;
}
