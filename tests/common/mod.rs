// Shared test helpers
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use trafficdash::error::{DashboardError, Result};
use trafficdash::models::Record;
use trafficdash::snapshot_loader::SnapshotSource;
use trafficdash::store::{DashboardStore, StoreConfig};

pub fn base_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2025-08-01T10:00:00+05:30").unwrap()
}

/// POST record observed `seq` seconds after `base_time`, with a url unique to `seq`.
pub fn record(seq: i64, status_code: Option<i64>) -> Record {
    Record {
        timestamp: base_time() + Duration::seconds(seq),
        method: "POST".into(),
        url: format!("http://localhost:8000/api/v1/hackrx/run?seq={}", seq),
        client_ip: "127.0.0.1".into(),
        status_code,
        response_time_ms: 120.5,
        headers: [("content-type".to_string(), "application/json".to_string())]
            .into_iter()
            .collect(),
        body: Some(r#"{"documents":"doc.pdf","questions":["q1","q2"]}"#.into()),
        response_body: Some(r#"{"answers":["a1","a2"]}"#.into()),
    }
}

pub fn ok(seq: i64) -> Record {
    record(seq, Some(200))
}

pub fn failed(seq: i64) -> Record {
    record(seq, Some(500))
}

/// `new_request` envelope as the live channel sends it.
pub fn new_request_message(record: &Record) -> String {
    serde_json::json!({ "type": "new_request", "data": record }).to_string()
}

pub fn store_with_capacity(capacity: usize) -> Arc<DashboardStore> {
    Arc::new(DashboardStore::new(StoreConfig {
        capacity,
        ..StoreConfig::default()
    }))
}

/// In-memory snapshot source; `None` simulates a failed retrieval.
pub struct StaticSource {
    history: Option<Vec<Record>>,
}

impl StaticSource {
    pub fn ok(history: Vec<Record>) -> Self {
        Self {
            history: Some(history),
        }
    }

    pub fn unavailable() -> Self {
        Self { history: None }
    }
}

impl SnapshotSource for StaticSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        self.history
            .clone()
            .ok_or_else(|| DashboardError::SnapshotUnavailable("connection refused".into()))
    }
}
