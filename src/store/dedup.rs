// Bounded memory of recently admitted record fingerprints (optional duplicate guard).

use std::collections::{HashSet, VecDeque};

use crate::models::RecordFingerprint;

pub(super) struct RecentFingerprints {
    order: VecDeque<RecordFingerprint>,
    seen: HashSet<RecordFingerprint>,
    capacity: usize,
}

impl RecentFingerprints {
    /// `None` when capacity is 0 (guard disabled).
    pub(super) fn with_capacity(capacity: usize) -> Option<Self> {
        (capacity > 0).then(|| Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        })
    }

    pub(super) fn contains(&self, fingerprint: &RecordFingerprint) -> bool {
        self.seen.contains(fingerprint)
    }

    /// Remembers `fingerprint`, forgetting the oldest one past capacity.
    pub(super) fn remember(&mut self, fingerprint: RecordFingerprint) {
        if !self.seen.insert(fingerprint.clone()) {
            return;
        }
        self.order.push_back(fingerprint);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.order.len()
    }
}
