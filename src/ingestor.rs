// Live event ingestion: classify channel messages and fold new records into the store.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

use crate::error::{DashboardError, Result};
use crate::models::{Aggregates, Envelope, NEW_REQUEST_EVENT, Record};
use crate::store::DashboardStore;

/// Parses one live message. `Ok(None)` for envelope types other than `new_request`.
pub fn parse_message(text: &str) -> Result<Option<Record>> {
    let envelope: Envelope = serde_json::from_str(text)
        .map_err(|e| DashboardError::MalformedEvent(format!("envelope: {}", e)))?;
    if envelope.type_ != NEW_REQUEST_EVENT {
        return Ok(None);
    }
    let record = serde_json::from_value(envelope.data)
        .map_err(|e| DashboardError::MalformedEvent(format!("record: {}", e)))?;
    Ok(Some(record))
}

#[derive(Default)]
struct IngestCounters {
    ingested: AtomicU64,
    ignored: AtomicU64,
    malformed: AtomicU64,
    duplicates: AtomicU64,
}

/// Point-in-time copy of the ingestor's message counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    pub ingested: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub duplicates: u64,
}

/// Sole writer of live events into the store. Obtained from `snapshot_loader::load`.
pub struct Ingestor {
    store: Arc<DashboardStore>,
    counters: IngestCounters,
}

impl Ingestor {
    pub(crate) fn new(store: Arc<DashboardStore>) -> Self {
        Self {
            store,
            counters: IngestCounters::default(),
        }
    }

    pub fn store(&self) -> &Arc<DashboardStore> {
        &self.store
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            ingested: self.counters.ingested.load(Ordering::Relaxed),
            ignored: self.counters.ignored.load(Ordering::Relaxed),
            malformed: self.counters.malformed.load(Ordering::Relaxed),
            duplicates: self.counters.duplicates.load(Ordering::Relaxed),
        }
    }

    /// Admits one new record. Arrival order is the only order; `timestamp` is not consulted.
    pub async fn on_event(&self, record: Record) -> Result<Aggregates> {
        match self.store.admit(record).await {
            Ok(aggregates) => {
                self.counters.ingested.fetch_add(1, Ordering::Relaxed);
                Ok(aggregates)
            }
            Err(DashboardError::DuplicateEvent) => {
                self.counters.duplicates.fetch_add(1, Ordering::Relaxed);
                Err(DashboardError::DuplicateEvent)
            }
            Err(e) => Err(e),
        }
    }

    /// Handles one raw text message. Returns the updated aggregates, or `None` when
    /// the envelope type is not ours. A malformed message leaves the store untouched.
    pub async fn on_message(&self, text: &str) -> Result<Option<Aggregates>> {
        let record = match parse_message(text) {
            Ok(Some(record)) => record,
            Ok(None) => {
                self.counters.ignored.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            Err(e) => {
                self.counters.malformed.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };
        self.on_event(record).await.map(Some)
    }

    /// Drains a live channel until it ends. Every per-message error is logged and
    /// skipped; only the end of the channel (or a closed session) stops the loop.
    /// Always returns the reason the channel stopped.
    pub async fn consume<S, E>(&self, mut frames: S) -> DashboardError
    where
        S: Stream<Item = std::result::Result<Message, E>> + Unpin,
        E: Display,
    {
        while let Some(frame) = frames.next().await {
            let outcome = match frame {
                Ok(Message::Text(text)) => self.on_message(text.as_str()).await,
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => self.on_message(text).await,
                    Err(e) => {
                        self.counters.malformed.fetch_add(1, Ordering::Relaxed);
                        Err(DashboardError::MalformedEvent(format!("binary frame: {}", e)))
                    }
                },
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| format!("close frame {}: {}", u16::from(f.code), f.reason.as_str()))
                        .unwrap_or_else(|| "close frame".to_string());
                    return DashboardError::ChannelClosed(reason);
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => return DashboardError::ChannelClosed(e.to_string()),
            };
            match outcome {
                Ok(Some(aggregates)) => {
                    debug!(
                        operation = "ingest",
                        total = aggregates.total,
                        success = aggregates.success,
                        failed = aggregates.failed,
                        "live record ingested"
                    );
                }
                Ok(None) => {}
                Err(DashboardError::SessionClosed) => return DashboardError::SessionClosed,
                Err(e) => {
                    warn!(error = %e, operation = "ingest", "live event discarded");
                }
            }
        }
        DashboardError::ChannelClosed("stream ended".to_string())
    }
}
