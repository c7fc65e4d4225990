// Dashboard session: snapshot phase, then the live channel with reconnects, until shutdown.
// Events published while the channel is down are never backfilled, so the counters
// under-count the server's totals after a reconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::oneshot;
use tokio::time::{Duration, interval, sleep};
use tracing::Instrument;

use crate::error::DashboardError;
use crate::ingestor::Ingestor;
use crate::live_channel;
use crate::snapshot_loader::{self, LoadOutcome, SnapshotSource};
use crate::store::DashboardStore;

/// Store, sources and shutdown for one session.
pub struct SessionDeps<S> {
    pub store: Arc<DashboardStore>,
    pub snapshot_source: S,
    pub live_url: String,
    /// Connected /ws/dashboard readers, for the stats log only.
    pub ws_clients: Arc<AtomicUsize>,
    pub shutdown_rx: oneshot::Receiver<()>,
}

/// Reconnect and logging timing.
pub struct SessionConfig {
    pub reconnect_initial_delay_ms: u64,
    pub reconnect_max_delay_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

/// Next reconnect delay: doubles, capped at `max`.
pub fn next_backoff(current: Duration, max: Duration) -> Duration {
    current.saturating_mul(2).min(max)
}

/// Spawns the session task. The store is closed for writes when the task ends.
pub fn spawn<S>(deps: SessionDeps<S>, config: SessionConfig) -> tokio::task::JoinHandle<()>
where
    S: SnapshotSource + Send + Sync + 'static,
{
    let SessionDeps {
        store,
        snapshot_source,
        live_url,
        ws_clients,
        mut shutdown_rx,
    } = deps;
    let SessionConfig {
        reconnect_initial_delay_ms,
        reconnect_max_delay_ms,
        stats_log_interval_secs,
    } = config;

    let initial_delay = Duration::from_millis(reconnect_initial_delay_ms);
    let max_delay = Duration::from_millis(reconnect_max_delay_ms).max(initial_delay);
    let stats_log_interval = Duration::from_secs(stats_log_interval_secs);

    let session_span = tracing::span!(tracing::Level::DEBUG, "session", live_url = %live_url);

    tokio::spawn(
        async move {
            let report = tokio::select! {
                report = snapshot_loader::load(store.clone(), &snapshot_source) => report,
                _ = &mut shutdown_rx => {
                    tracing::debug!("Session shut down during snapshot phase");
                    store.close().await;
                    return;
                }
            };
            let ingestor = match report {
                Ok(report) => {
                    if let LoadOutcome::Degraded(e) = &report.outcome {
                        tracing::info!(error = %e, "running in degraded mode");
                    }
                    report.ingestor
                }
                Err(e) => {
                    tracing::warn!(error = %e, operation = "load_snapshot", "snapshot phase rejected");
                    store.close().await;
                    return;
                }
            };

            let mut stats_log_tick = interval(stats_log_interval);
            stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            let mut delay = initial_delay;
            let mut reconnects: u64 = 0;

            'session: loop {
                let connect = live_channel::connect(&live_url);
                tokio::pin!(connect);
                let channel = loop {
                    tokio::select! {
                        channel = &mut connect => break channel,
                        _ = stats_log_tick.tick() => {
                            log_stats(&ingestor, &ws_clients, reconnects).await;
                        }
                        _ = &mut shutdown_rx => break 'session,
                    }
                };

                match channel {
                    Ok(frames) => {
                        tracing::info!(reconnects, "Live channel connected");
                        delay = initial_delay;
                        let consume = ingestor.consume(frames);
                        tokio::pin!(consume);
                        loop {
                            tokio::select! {
                                reason = &mut consume => {
                                    if matches!(reason, DashboardError::SessionClosed) {
                                        break 'session;
                                    }
                                    tracing::warn!(
                                        error = %reason,
                                        operation = "live_channel",
                                        "Live channel lost; events until reconnect will not be backfilled"
                                    );
                                    break;
                                }
                                _ = stats_log_tick.tick() => {
                                    log_stats(&ingestor, &ws_clients, reconnects).await;
                                }
                                _ = &mut shutdown_rx => break 'session,
                            }
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            operation = "live_channel",
                            retry_in_ms = delay.as_millis() as u64,
                            "Live channel connect failed"
                        );
                    }
                }

                let backoff = sleep(delay);
                tokio::pin!(backoff);
                loop {
                    tokio::select! {
                        _ = &mut backoff => break,
                        _ = stats_log_tick.tick() => {
                            log_stats(&ingestor, &ws_clients, reconnects).await;
                        }
                        _ = &mut shutdown_rx => break 'session,
                    }
                }
                reconnects += 1;
                delay = next_backoff(delay, max_delay);
            }

            store.close().await;
            tracing::debug!("Session shutting down");
        }
        .instrument(session_span),
    )
}

async fn log_stats(ingestor: &Ingestor, ws_clients: &AtomicUsize, reconnects: u64) {
    let snapshot = ingestor.store().snapshot().await;
    let stats = ingestor.stats();
    tracing::info!(
        total = snapshot.aggregates.total,
        success = snapshot.aggregates.success,
        failed = snapshot.aggregates.failed,
        window_len = snapshot.window.len(),
        ingested = stats.ingested,
        ignored = stats.ignored,
        malformed = stats.malformed,
        duplicates = stats.duplicates,
        reconnects,
        ws_dashboard_clients = ws_clients.load(Ordering::Relaxed),
        "app stats"
    );
}
