use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::debug;

/// Stages of a single entity sync, in execution order.
///
/// `Failed` may follow any stage; everything else moves strictly forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Start,
    Auth,
    Count,
    PageIds,
    ReadDetails,
    Transform,
    Clear,
    Write,
    Done,
    Failed,
}

impl SyncStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Start => "start",
            SyncStage::Auth => "auth",
            SyncStage::Count => "count",
            SyncStage::PageIds => "page_ids",
            SyncStage::ReadDetails => "read_details",
            SyncStage::Transform => "transform",
            SyncStage::Clear => "clear",
            SyncStage::Write => "write",
            SyncStage::Done => "done",
            SyncStage::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStage::Done | SyncStage::Failed)
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current stage of one entity sync.
#[derive(Debug)]
pub struct StageTracker {
    entity: String,
    stage: SyncStage,
    last_active: SyncStage,
    started: Instant,
}

impl StageTracker {
    pub fn new(entity: &str) -> Self {
        StageTracker {
            entity: entity.to_string(),
            stage: SyncStage::Start,
            last_active: SyncStage::Start,
            started: Instant::now(),
        }
    }

    /// Moves to `next`. Transitions out of a terminal stage, or backwards,
    /// are ignored.
    pub fn enter(&mut self, next: SyncStage) {
        if self.stage.is_terminal() || (next != SyncStage::Failed && next < self.stage) {
            return;
        }
        debug!(entity = %self.entity, from = %self.stage, to = %next, "Stage transition");
        if next != SyncStage::Failed {
            self.last_active = next;
        }
        self.stage = next;
    }

    pub fn fail(&mut self) {
        self.enter(SyncStage::Failed);
    }

    pub fn stage(&self) -> SyncStage {
        self.stage
    }

    /// The last non-failed stage reached; where a failure happened.
    pub fn last_active(&self) -> SyncStage {
        self.last_active
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
