use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

#[derive(Debug, Default)]
struct InnerMetrics {
    ids_collected: AtomicU64,
    id_pages: AtomicU64,
    detail_reads: AtomicU64,
    records_fetched: AtomicU64,
    records_transformed: AtomicU64,
    records_skipped: AtomicU64,
    records_dropped: AtomicU64,
    rows_written: AtomicU64,
    batches_written: AtomicU64,
    failure_count: AtomicU64,
    retry_count: AtomicU64,
}

/// Counters for one entity sync. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct Metrics {
    inner: Arc<InnerMetrics>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub ids_collected: u64,
    pub id_pages: u64,
    pub detail_reads: u64,
    pub records_fetched: u64,
    pub records_transformed: u64,
    pub records_skipped: u64,
    pub records_dropped: u64,
    pub rows_written: u64,
    pub batches_written: u64,
    pub failure_count: u64,
    pub retry_count: u64,
}

macro_rules! counter {
    ($name:ident, $field:ident) => {
        pub fn $name(&self, count: u64) {
            self.inner.$field.fetch_add(count, Ordering::Relaxed);
        }
    };
}

impl Metrics {
    pub fn new() -> Self {
        Metrics {
            inner: Arc::new(InnerMetrics::default()),
        }
    }

    counter!(increment_ids, ids_collected);
    counter!(increment_id_pages, id_pages);
    counter!(increment_detail_reads, detail_reads);
    counter!(increment_fetched, records_fetched);
    counter!(increment_transformed, records_transformed);
    counter!(increment_skipped, records_skipped);
    counter!(increment_dropped, records_dropped);
    counter!(increment_rows_written, rows_written);
    counter!(increment_batches, batches_written);
    counter!(increment_failures, failure_count);
    counter!(increment_retries, retry_count);

    pub fn snapshot(&self) -> MetricsSnapshot {
        let load = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            ids_collected: load(&self.inner.ids_collected),
            id_pages: load(&self.inner.id_pages),
            detail_reads: load(&self.inner.detail_reads),
            records_fetched: load(&self.inner.records_fetched),
            records_transformed: load(&self.inner.records_transformed),
            records_skipped: load(&self.inner.records_skipped),
            records_dropped: load(&self.inner.records_dropped),
            rows_written: load(&self.inner.rows_written),
            batches_written: load(&self.inner.batches_written),
            failure_count: load(&self.inner.failure_count),
            retry_count: load(&self.inner.retry_count),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
