use crate::{
    entity::{EntitySync, not_attempted},
    error::SyncError,
};
use chrono::Utc;
use connectors::{
    erp::{Authenticator, ErpClient, ErpConnector},
    rest::{RestClient, TableStore},
};
use engine_config::{
    report::summary::{EntityStatus, SyncReport},
    settings::{BatchSettings, SyncSettings, entity::EntityPlan},
};
use engine_core::{progress::SyncStage, retry::RetryPolicy};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Builds ERP and store clients from `settings` and syncs every selected
/// entity.
pub async fn run(
    settings: &SyncSettings,
    dry_run: bool,
    cancel: CancellationToken,
) -> Result<SyncReport, SyncError> {
    let erp = ErpClient::new(settings.erp.config.clone()).map_err(SyncError::Client)?;
    let store = RestClient::new(settings.store.clone()).map_err(SyncError::Client)?;
    let connector = ErpConnector::new(Arc::new(erp), settings.erp.credentials.clone());

    let report = SyncExecutor::new(
        Arc::new(connector),
        Arc::new(store),
        settings.batch,
        settings.retry.clone(),
    )
    .dry_run(dry_run)
    .with_cancel(cancel)
    .execute(&settings.entities)
    .await;

    Ok(report)
}

/// Sequential driver over a list of entity plans.
///
/// Authenticates once, then runs each plan in order. A failed entity does not
/// stop its siblings, except on authentication failure.
pub struct SyncExecutor {
    auth: Arc<dyn Authenticator>,
    store: Arc<dyn TableStore>,
    batch: BatchSettings,
    retry: RetryPolicy,
    dry_run: bool,
    cancel: CancellationToken,
}

impl SyncExecutor {
    pub fn new(
        auth: Arc<dyn Authenticator>,
        store: Arc<dyn TableStore>,
        batch: BatchSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            auth,
            store,
            batch,
            retry,
            dry_run: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Checked before each entity; the entity in progress runs to completion.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn execute(&self, plans: &[EntityPlan]) -> SyncReport {
        let started_at = Utc::now();
        let mut report = SyncReport::new(started_at);
        info!(
            entities = plans.len(),
            dry_run = self.dry_run,
            "Starting sync run"
        );

        let reader = match self.auth.authenticate().await {
            Ok(reader) => reader,
            Err(e) => {
                let err = SyncError::Auth(e);
                error!(error = %err, "Authentication failed, no entity will be synced");
                let reason = err.to_string();
                for plan in plans {
                    report.push(not_attempted(plan, &reason, self.dry_run));
                }
                if let Some(first) = report.entities.first_mut() {
                    first.status = EntityStatus::Failed;
                    first.failed_stage = Some(SyncStage::Auth);
                    first.error_class = Some(err.class());
                }
                return report.finish();
            }
        };

        let total = plans.len();
        let mut halted: Option<String> = None;

        for (idx, plan) in plans.iter().enumerate() {
            if let Some(reason) = &halted {
                report.push(not_attempted(plan, reason, self.dry_run));
                continue;
            }
            if self.cancel.is_cancelled() {
                warn!(
                    entity = %plan.name,
                    remaining = total - idx,
                    "Shutdown requested, not starting remaining entities"
                );
                let reason = "shutdown requested".to_string();
                report.push(not_attempted(plan, &reason, self.dry_run));
                halted = Some(reason);
                continue;
            }

            info!(entity = %plan.name, "Processing entity {}/{}", idx + 1, total);
            let (entity_report, err) = EntitySync::new(
                plan,
                Arc::clone(&reader),
                Arc::clone(&self.store),
                &self.batch,
                self.retry.clone(),
            )
            .dry_run(self.dry_run)
            .run(Utc::now())
            .await;
            report.push(entity_report);

            if let Some(err) = err
                && err.is_fatal()
            {
                halted = Some(format!("run halted after '{}' failed: {err}", plan.name));
            }
        }

        let report = report.finish();
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            rows = report.rows_written(),
            "Sync run finished"
        );
        report
    }
}
