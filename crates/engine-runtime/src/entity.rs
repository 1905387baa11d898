use crate::error::SyncError;
use chrono::{DateTime, Utc};
use connectors::{erp::RemoteReader, rest::TableStore};
use engine_config::{
    report::summary::{EntityReport, EntityStatus},
    settings::{BatchSettings, entity::EntityPlan},
};
use engine_core::{
    metrics::Metrics,
    progress::{StageTracker, SyncStage},
    retry::RetryPolicy,
};
use engine_processing::{fetcher::BatchedFetcher, transform::Transformer, writer::BulkWriter};
use std::sync::Arc;
use tracing::{error, info};

/// Runs one entity plan through count, paging, detail reads, transform and
/// write. The reader must already be authenticated.
pub struct EntitySync<'a> {
    plan: &'a EntityPlan,
    reader: Arc<dyn RemoteReader>,
    store: Arc<dyn TableStore>,
    batches: BatchSettings,
    retry: RetryPolicy,
    dry_run: bool,
    metrics: Metrics,
    tracker: StageTracker,
}

impl<'a> EntitySync<'a> {
    pub fn new(
        plan: &'a EntityPlan,
        reader: Arc<dyn RemoteReader>,
        store: Arc<dyn TableStore>,
        defaults: &BatchSettings,
        retry: RetryPolicy,
    ) -> Self {
        let metrics = Metrics::new();
        Self {
            plan,
            reader,
            store,
            batches: plan.batches(defaults),
            retry: retry.with_metrics(metrics.clone()),
            dry_run: false,
            metrics,
            tracker: StageTracker::new(&plan.name),
        }
    }

    /// Fetch and transform only; nothing is cleared or written.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(mut self, now: DateTime<Utc>) -> (EntityReport, Option<SyncError>) {
        info!(
            entity = %self.plan.name,
            collection = %self.plan.collection,
            table = %self.plan.table,
            mode = self.plan.write_mode.as_str(),
            dry_run = self.dry_run,
            "Starting entity sync"
        );

        // The session is shared across entities and opened before the first.
        self.tracker.enter(SyncStage::Auth);

        match self.execute(now).await {
            Ok(()) => {
                self.tracker.enter(SyncStage::Done);
                let report = self.report(EntityStatus::Succeeded, None);
                info!(
                    entity = %report.entity,
                    rows = report.metrics.rows_written,
                    skipped = report.metrics.records_skipped,
                    dropped = report.metrics.records_dropped,
                    duration_ms = report.duration_ms,
                    "Entity sync complete"
                );
                (report, None)
            }
            Err(err) => {
                self.tracker.fail();
                self.metrics.increment_failures(1);
                error!(
                    entity = %self.plan.name,
                    stage = %self.tracker.last_active(),
                    class = %err.class(),
                    error = %err,
                    "Entity sync failed"
                );
                let report = self.report(EntityStatus::Failed, Some(&err));
                (report, Some(err))
            }
        }
    }

    async fn execute(&mut self, now: DateTime<Utc>) -> Result<(), SyncError> {
        let plan = self.plan;
        let fetcher = BatchedFetcher::new(
            Arc::clone(&self.reader),
            self.retry.clone(),
            self.metrics.clone(),
            self.batches.page_size,
            self.batches.read_batch_size,
        );

        self.tracker.enter(SyncStage::Count);
        let filter = plan.effective_filter(now)?;
        let total = fetcher.count(&plan.collection, &filter).await?;

        self.tracker.enter(SyncStage::PageIds);
        let ids = fetcher.collect_ids(&plan.collection, &filter, total).await?;

        self.tracker.enter(SyncStage::ReadDetails);
        let records = fetcher
            .read_details(&plan.collection, &ids, &plan.fields)
            .await?;

        self.tracker.enter(SyncStage::Transform);
        let outcome = Transformer::new(plan, now, self.metrics.clone()).transform_all(&records);

        if self.dry_run {
            info!(
                entity = %plan.name,
                rows = outcome.rows.len(),
                "Dry run, skipping destination writes"
            );
            return Ok(());
        }

        let writer = BulkWriter::new(
            Arc::clone(&self.store),
            self.retry.clone(),
            self.metrics.clone(),
            self.batches.insert_batch_size,
        );
        let tracker = &mut self.tracker;
        writer
            .write(&plan.table, outcome.rows, &plan.write_mode, |stage| {
                tracker.enter(stage)
            })
            .await?;

        Ok(())
    }

    fn report(&self, status: EntityStatus, err: Option<&SyncError>) -> EntityReport {
        EntityReport {
            entity: self.plan.name.clone(),
            table: self.plan.table.clone(),
            write_mode: self.plan.write_mode.as_str().to_string(),
            status,
            failed_stage: err.map(|_| self.tracker.last_active()),
            error_class: err.map(SyncError::class),
            error: err.map(ToString::to_string),
            metrics: self.metrics.snapshot(),
            duration_ms: self.tracker.elapsed().as_millis() as u64,
            dry_run: self.dry_run,
        }
    }
}

/// Report for an entity that never started.
pub fn not_attempted(plan: &EntityPlan, reason: &str, dry_run: bool) -> EntityReport {
    EntityReport {
        entity: plan.name.clone(),
        table: plan.table.clone(),
        write_mode: plan.write_mode.as_str().to_string(),
        status: EntityStatus::Skipped,
        failed_stage: None,
        error_class: None,
        error: Some(reason.to_string()),
        metrics: Default::default(),
        duration_ms: 0,
        dry_run,
    }
}
