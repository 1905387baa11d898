use chrono::{DateTime, Utc};
use engine_core::{error::ErrorClass, metrics::MetricsSnapshot, progress::SyncStage};
use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityStatus {
    Succeeded,
    Failed,
    /// Not attempted because the run stopped on a fatal error.
    Skipped,
}

/// Outcome of syncing one entity.
#[derive(Serialize, Debug, Clone)]
pub struct EntityReport {
    pub entity: String,
    pub table: String,
    pub write_mode: String,
    pub status: EntityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<SyncStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub metrics: MetricsSnapshot,
    pub duration_ms: u64,
    pub dry_run: bool,
}

impl EntityReport {
    pub fn succeeded(&self) -> bool {
        self.status == EntityStatus::Succeeded
    }
}

#[derive(Serialize, Debug, Clone)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub entities: Vec<EntityReport>,
}

impl SyncReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            entities: Vec::new(),
        }
    }

    pub fn push(&mut self, report: EntityReport) {
        self.entities.push(report);
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn succeeded(&self) -> usize {
        self.entities.iter().filter(|e| e.succeeded()).count()
    }

    /// Entities that failed or were never attempted.
    pub fn failed(&self) -> usize {
        self.entities.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub fn rows_written(&self) -> u64 {
        self.entities.iter().map(|e| e.metrics.rows_written).sum()
    }

    /// True when any entity failed on an authentication error.
    pub fn auth_failed(&self) -> bool {
        self.entities
            .iter()
            .any(|e| e.error_class == Some(ErrorClass::Auth))
    }
}
