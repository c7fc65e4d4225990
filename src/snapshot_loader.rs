// One-shot bulk load of historical records into the store.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::error::{DashboardError, Result};
use crate::ingestor::Ingestor;
use crate::models::{Aggregates, LogsResponse, Record, StorePhase};
use crate::store::DashboardStore;
use crate::version;

/// Where the historical records come from. Records must be oldest first.
pub trait SnapshotSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Record>>> + Send;
}

/// Fetches `{ "logs": [...] }` from the monitored service over HTTP.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(version::user_agent())
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<Vec<Record>> {
        let unavailable = |e: reqwest::Error| DashboardError::SnapshotUnavailable(e.to_string());
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body: LogsResponse = response.json().await.map_err(unavailable)?;
        Ok(body.logs)
    }
}

/// How the snapshot phase ended.
#[derive(Debug)]
pub enum LoadOutcome {
    /// Store seeded; carries the initial aggregates.
    Loaded(Aggregates),
    /// Source failed; store is live-only and counts from zero.
    Degraded(DashboardError),
}

/// Result of the snapshot phase. The ingestor is only handed out here, so live
/// events can never reach a store the loader has not finished with.
pub struct LoadReport {
    pub ingestor: Ingestor,
    pub outcome: LoadOutcome,
}

/// Runs the snapshot phase once for `store`. A failed fetch is not an error: the
/// store goes degraded and the returned ingestor still works. Calling this again on
/// the same store fails with `AlreadyInitialized` and leaves the counters alone.
#[instrument(skip(store, source), fields(operation = "load_snapshot"))]
pub async fn load<S: SnapshotSource>(
    store: Arc<DashboardStore>,
    source: &S,
) -> Result<LoadReport> {
    match store.phase().await {
        StorePhase::Pending => {}
        StorePhase::Closed => return Err(DashboardError::SessionClosed),
        StorePhase::Ready | StorePhase::Degraded => {
            return Err(DashboardError::AlreadyInitialized);
        }
    }

    let outcome = match source.fetch().await {
        Ok(history) => {
            let aggregates = store.initialize(history).await?;
            info!(
                total = aggregates.total,
                success = aggregates.success,
                failed = aggregates.failed,
                "snapshot loaded"
            );
            LoadOutcome::Loaded(aggregates)
        }
        Err(e) => {
            store.mark_degraded().await?;
            warn!(error = %e, "snapshot unavailable; starting live-only with zeroed stats");
            LoadOutcome::Degraded(e)
        }
    };

    Ok(LoadReport {
        ingestor: Ingestor::new(store),
        outcome,
    })
}
