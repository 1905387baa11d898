use crate::{error::FetchError, retry::run_call};
use connectors::erp::{Domain, RemoteReader};
use engine_core::{metrics::Metrics, retry::RetryPolicy};
use model::{pagination::cursor::BatchCursor, records::source::SourceRecord};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

/// Pulls a remote collection in two phases: identifier pages, then detail
/// reads in fixed-size chunks. Every remote call is sequential.
pub struct BatchedFetcher {
    reader: Arc<dyn RemoteReader>,
    retry: RetryPolicy,
    metrics: Metrics,
    page_size: usize,
    read_batch_size: usize,
}

impl BatchedFetcher {
    pub fn new(
        reader: Arc<dyn RemoteReader>,
        retry: RetryPolicy,
        metrics: Metrics,
        page_size: usize,
        read_batch_size: usize,
    ) -> Self {
        let page_size = page_size.max(1);
        Self {
            reader,
            retry,
            metrics,
            page_size,
            read_batch_size: read_batch_size.clamp(1, page_size),
        }
    }

    pub async fn count(&self, collection: &str, filter: &Domain) -> Result<u64, FetchError> {
        let total = run_call(&self.retry, "search_count", || {
            let reader = Arc::clone(&self.reader);
            async move { reader.count(collection, filter).await }
        })
        .await
        .map_err(|source| FetchError::Count {
            collection: collection.to_string(),
            source,
        })?;

        info!(collection, total, "Counted matching records");
        Ok(total)
    }

    /// Collects up to `total` distinct identifiers, `page_size` at a time,
    /// stopping early on an empty page.
    pub async fn collect_ids(
        &self,
        collection: &str,
        filter: &Domain,
        total: u64,
    ) -> Result<Vec<i64>, FetchError> {
        let mut cursor = BatchCursor::new(total);

        while !cursor.is_done() {
            let offset = cursor.next_offset;
            let limit = self.page_size;
            let page = run_call(&self.retry, "search", || {
                let reader = Arc::clone(&self.reader);
                async move {
                    reader
                        .fetch_identifiers(collection, filter, offset, limit)
                        .await
                }
            })
            .await
            .map_err(|source| FetchError::Page {
                collection: collection.to_string(),
                offset,
                source,
            })?;

            self.metrics.increment_id_pages(1);
            let accepted = cursor.advance(&page);
            self.metrics.increment_ids(accepted as u64);
            debug!(
                collection,
                offset,
                returned = page.len(),
                accepted,
                collected = cursor.collected().len(),
                "Identifier page fetched"
            );
        }

        let collected = cursor.collected().len() as u64;
        if collected < total {
            warn!(
                collection,
                expected = total,
                collected,
                "Source returned fewer identifiers than counted"
            );
        }

        Ok(cursor.into_ids())
    }

    /// Reads `fields` for `ids` in chunks of `read_batch_size`.
    ///
    /// Records outside the requested set, or repeated, are discarded.
    /// Records without an id are passed through for the transformer to reject.
    pub async fn read_details(
        &self,
        collection: &str,
        ids: &[i64],
        fields: &[String],
    ) -> Result<Vec<SourceRecord>, FetchError> {
        let requested: HashSet<i64> = ids.iter().copied().collect();
        let mut seen = HashSet::with_capacity(ids.len());
        let mut records = Vec::with_capacity(ids.len());

        for (chunk_no, chunk) in ids.chunks(self.read_batch_size).enumerate() {
            let batch = run_call(&self.retry, "read", || {
                let reader = Arc::clone(&self.reader);
                async move { reader.fetch_records(collection, chunk, fields).await }
            })
            .await
            .map_err(|source| FetchError::Read {
                collection: collection.to_string(),
                ids: chunk.len(),
                source,
            })?;

            self.metrics.increment_detail_reads(1);
            let returned = batch.len();
            for record in batch {
                match record.id() {
                    Some(id) if !requested.contains(&id) || !seen.insert(id) => {
                        debug!(collection, id, "Discarding unexpected or repeated record");
                    }
                    _ => records.push(record),
                }
            }

            debug!(
                collection,
                chunk = chunk_no + 1,
                requested = chunk.len(),
                returned,
                "Detail batch read"
            );
        }

        self.metrics.increment_fetched(records.len() as u64);
        info!(
            collection,
            ids = ids.len(),
            records = records.len(),
            "Detail reads complete"
        );
        Ok(records)
    }
}
