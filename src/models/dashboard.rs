// Read models handed to presentation

use serde::{Deserialize, Serialize};

use super::Record;

/// Running counters over every record observed in the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    pub total: u64,
    pub success: u64,
    pub failed: u64,
}

impl Aggregates {
    /// Counts a chronological history in one pass.
    pub fn from_records(records: &[Record]) -> Self {
        let mut aggregates = Self::default();
        for record in records {
            aggregates.observe(record);
        }
        aggregates
    }

    pub fn observe(&mut self, record: &Record) {
        self.total += 1;
        if record.is_success() {
            self.success += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Lifecycle of the store; serializes lowercase (e.g. "degraded").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorePhase {
    /// Waiting for the snapshot loader.
    Pending,
    /// Seeded from the bulk snapshot.
    Ready,
    /// Snapshot unavailable; live-only, counters started at zero.
    Degraded,
    /// Session torn down; no further writes.
    Closed,
}

impl StorePhase {
    pub fn accepts_live_events(self) -> bool {
        matches!(self, StorePhase::Ready | StorePhase::Degraded)
    }
}

/// Consistent copy of window + aggregates taken under one lock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Bumped on every mutation.
    pub revision: u64,
    pub phase: StorePhase,
    pub aggregates: Aggregates,
    /// Newest first.
    pub window: Vec<Record>,
}
