use crate::{error::WriteError, retry::run_call};
use connectors::{
    error::ConnectorError,
    rest::{ScopeFilter, TableStore},
};
use engine_config::settings::entity::WriteMode;
use engine_core::{metrics::Metrics, progress::SyncStage, retry::RetryPolicy};
use model::records::{batch::Batch, row::RowData};
use std::{sync::Arc, time::Instant};
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub rows_written: usize,
    pub batches: usize,
    pub cleared: bool,
    pub duration: std::time::Duration,
}

/// Writes transformed rows to one destination table, batch by batch.
///
/// Batches are sent strictly in order. The first failing batch aborts the
/// write; batches before it stay committed.
pub struct BulkWriter {
    store: Arc<dyn TableStore>,
    retry: RetryPolicy,
    metrics: Metrics,
    batch_size: usize,
}

impl BulkWriter {
    pub fn new(
        store: Arc<dyn TableStore>,
        retry: RetryPolicy,
        metrics: Metrics,
        batch_size: usize,
    ) -> Self {
        Self {
            store,
            retry,
            metrics,
            batch_size: batch_size.max(1),
        }
    }

    /// Applies `mode`: clear then insert, or upsert without clearing.
    ///
    /// `on_stage` is told when the write enters `Clear` and `Write`, so a
    /// failure can be attributed to the right stage.
    pub async fn write(
        &self,
        table: &str,
        rows: Vec<RowData>,
        mode: &WriteMode,
        mut on_stage: impl FnMut(SyncStage),
    ) -> Result<WriteOutcome, WriteError> {
        match mode {
            WriteMode::ClearInsert { scope } => {
                on_stage(SyncStage::Clear);
                self.clear(table, scope).await?;
                on_stage(SyncStage::Write);
                let outcome = self.write_batches(table, rows, None).await?;
                Ok(WriteOutcome {
                    cleared: true,
                    ..outcome
                })
            }
            WriteMode::Upsert { conflict_column } => {
                on_stage(SyncStage::Write);
                self.write_batches(table, rows, Some(conflict_column.as_str()))
                    .await
            }
        }
    }

    async fn clear(&self, table: &str, scope: &ScopeFilter) -> Result<(), WriteError> {
        run_call(&self.retry, "clear", || {
            let store = Arc::clone(&self.store);
            async move { store.clear(table, scope).await }
        })
        .await
        .map_err(|source| WriteError::Clear {
            table: table.to_string(),
            scope: scope.to_string(),
            source,
        })?;

        info!(table, scope = %scope, "Destination table cleared");
        Ok(())
    }

    /// Sends `rows` in batches of `batch_size`. `conflict_column` selects the
    /// upsert path.
    async fn write_batches(
        &self,
        table: &str,
        rows: Vec<RowData>,
        conflict_column: Option<&str>,
    ) -> Result<WriteOutcome, WriteError> {
        let start = Instant::now();
        let mut rows_written = 0;
        let mut batches = 0;

        for batch in Batch::split(table, rows, self.batch_size) {
            self.write_batch(&batch, conflict_column)
                .await
                .map_err(|source| WriteError::Batch {
                    batch_id: batch.id.clone(),
                    rows: batch.len(),
                    rows_committed: rows_written,
                    source,
                })?;

            rows_written += batch.len();
            batches += 1;
            self.metrics.increment_rows_written(batch.len() as u64);
            self.metrics.increment_batches(1);
        }

        Ok(WriteOutcome {
            rows_written,
            batches,
            cleared: false,
            duration: start.elapsed(),
        })
    }

    async fn write_batch(
        &self,
        batch: &Batch,
        conflict_column: Option<&str>,
    ) -> Result<(), ConnectorError> {
        let start = Instant::now();
        let table = batch.table.as_str();

        let rows = batch.rows.as_slice();
        run_call(&self.retry, "insert", || {
            let store = Arc::clone(&self.store);
            async move {
                match conflict_column {
                    Some(column) => store.upsert(table, rows, column).await,
                    None => store.insert(table, rows).await,
                }
            }
        })
        .await?;

        let duration = start.elapsed();
        let rows_per_sec = batch.len() as f64 / duration.as_secs_f64().max(f64::EPSILON);
        info!(
            batch_id = %batch.id,
            rows = batch.len(),
            upsert = conflict_column.is_some(),
            duration_ms = duration.as_millis() as u64,
            rows_per_sec = %format!("{:.2}", rows_per_sec),
            "Batch written"
        );
        Ok(())
    }
}
