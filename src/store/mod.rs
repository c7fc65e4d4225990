// Window & aggregate store: the single owned state shared by loader, ingestor and readers.
// All writes happen under the write lock together with the change notification, so
// observers see mutations in the order they were applied.

mod dedup;

use std::collections::VecDeque;

use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::models::{Aggregates, DashboardSnapshot, Record, StorePhase};
use dedup::RecentFingerprints;

/// Window size when none is configured.
pub const DEFAULT_WINDOW_CAPACITY: usize = 10;

/// Store sizing.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Max records kept in the recent window.
    pub capacity: usize,
    /// Fingerprints remembered by the duplicate guard; 0 disables it.
    pub dedup_capacity: usize,
    /// Buffered change notifications per subscriber (slow readers lag past this).
    pub broadcast_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_WINDOW_CAPACITY,
            dedup_capacity: 0,
            broadcast_capacity: 64,
        }
    }
}

pub struct DashboardStore {
    state: RwLock<StoreState>,
    changes: broadcast::Sender<DashboardSnapshot>,
    capacity: usize,
}

struct StoreState {
    phase: StorePhase,
    revision: u64,
    window: VecDeque<Record>,
    aggregates: Aggregates,
    recent: Option<RecentFingerprints>,
}

impl StoreState {
    fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            revision: self.revision,
            phase: self.phase,
            aggregates: self.aggregates,
            window: self.window.iter().cloned().collect(),
        }
    }
}

impl DashboardStore {
    pub fn new(config: StoreConfig) -> Self {
        let capacity = config.capacity.max(1);
        let (changes, _) = broadcast::channel(config.broadcast_capacity.max(1));
        Self {
            state: RwLock::new(StoreState {
                phase: StorePhase::Pending,
                revision: 0,
                window: VecDeque::with_capacity(capacity + 1),
                aggregates: Aggregates::default(),
                recent: RecentFingerprints::with_capacity(config.dedup_capacity),
            }),
            changes,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change notifications: one consistent snapshot after every successful mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<DashboardSnapshot> {
        self.changes.subscribe()
    }

    /// Recent records, newest first.
    pub async fn current_window(&self) -> Vec<Record> {
        self.state.read().await.window.iter().cloned().collect()
    }

    pub async fn current_aggregates(&self) -> Aggregates {
        self.state.read().await.aggregates
    }

    /// Window and aggregates copied under the same lock.
    pub async fn snapshot(&self) -> DashboardSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn phase(&self) -> StorePhase {
        self.state.read().await.phase
    }

    /// Seeds the store from a chronological (oldest-first) history. One-shot: a second
    /// call is rejected so the history is never counted twice.
    pub(crate) async fn initialize(&self, history: Vec<Record>) -> Result<Aggregates> {
        let mut state = self.state.write().await;
        match state.phase {
            StorePhase::Pending => {}
            StorePhase::Closed => return Err(DashboardError::SessionClosed),
            _ => return Err(DashboardError::AlreadyInitialized),
        }

        let aggregates = Aggregates::from_records(&history);
        if let Some(recent) = state.recent.as_mut() {
            for record in &history {
                recent.remember(record.fingerprint());
            }
        }
        let keep_from = history.len().saturating_sub(self.capacity);
        state.window = history.into_iter().skip(keep_from).rev().collect();
        state.aggregates = aggregates;
        state.phase = StorePhase::Ready;
        state.revision += 1;
        self.notify(&state);
        debug!(
            operation = "initialize",
            total = aggregates.total,
            window_len = state.window.len(),
            "store seeded from snapshot"
        );
        Ok(aggregates)
    }

    /// Enters live-only mode with an empty window and zeroed counters.
    pub(crate) async fn mark_degraded(&self) -> Result<()> {
        let mut state = self.state.write().await;
        match state.phase {
            StorePhase::Pending => {}
            StorePhase::Closed => return Err(DashboardError::SessionClosed),
            _ => return Err(DashboardError::AlreadyInitialized),
        }
        state.phase = StorePhase::Degraded;
        state.revision += 1;
        self.notify(&state);
        Ok(())
    }

    /// Admits one live record: prepend, evict past capacity, count. Returns the
    /// aggregates after the update.
    pub(crate) async fn admit(&self, record: Record) -> Result<Aggregates> {
        let mut state = self.state.write().await;
        if !state.phase.accepts_live_events() {
            return Err(match state.phase {
                StorePhase::Closed => DashboardError::SessionClosed,
                _ => DashboardError::NotInitialized,
            });
        }
        if let Some(recent) = state.recent.as_mut() {
            let fingerprint = record.fingerprint();
            if recent.contains(&fingerprint) {
                return Err(DashboardError::DuplicateEvent);
            }
            recent.remember(fingerprint);
        }

        state.aggregates.observe(&record);
        state.window.push_front(record);
        state.window.truncate(self.capacity);
        state.revision += 1;
        self.notify(&state);
        Ok(state.aggregates)
    }

    /// Stops all further writes. Readers keep the last state.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        if state.phase == StorePhase::Closed {
            return;
        }
        state.phase = StorePhase::Closed;
        state.revision += 1;
        self.notify(&state);
    }

    fn notify(&self, state: &StoreState) {
        // No receivers is normal when nobody is watching the dashboard.
        let _ = self.changes.send(state.snapshot());
    }
}
