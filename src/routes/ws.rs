// WebSocket push of dashboard snapshots: current state on connect, then one per store change.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant, timeout};

use super::AppState;
use crate::models::DashboardSnapshot;
use crate::store::DashboardStore;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the dashboard client count on drop (connect = +1, drop = -1).
struct WsClientGuard(Arc<AtomicUsize>);

impl Drop for WsClientGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(super) async fn ws_dashboard(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let store = state.store.clone();
    let conn_count = state.ws_clients.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe before the first read so no change between the two is lost.
        let mut rx = store.subscribe();
        if let Err(e) = stream_dashboard(socket, &mut rx, store, conn_count).await {
            tracing::info!("Dashboard stream error: {}", e);
        }
    })
}

/// Sends `snapshot` unless the client already has it or something newer.
/// Returns false when the client is gone or too slow.
async fn send_snapshot(
    socket: &mut WebSocket,
    snapshot: &DashboardSnapshot,
    last_sent: &mut Option<u64>,
) -> anyhow::Result<bool> {
    if last_sent.is_some_and(|rev| rev >= snapshot.revision) {
        return Ok(true);
    }
    let json = serde_json::to_string(snapshot)?;
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    if r.is_err() || r.unwrap_or(Ok(())).is_err() {
        return Ok(false);
    }
    *last_sent = Some(snapshot.revision);
    Ok(true)
}

async fn stream_dashboard(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<DashboardSnapshot>,
    store: Arc<DashboardStore>,
    conn_count: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsClientGuard(conn_count);
    tracing::info!("Client connected to dashboard stream");

    let mut last_sent = None;
    let welcome = store.snapshot().await;
    if !send_snapshot(&mut socket, &welcome, &mut last_sent).await? {
        return Ok(());
    }

    let mut ping_interval =
        tokio::time::interval_at(Instant::now() + WS_PING_INTERVAL, WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                let snapshot = match result {
                    Ok(snapshot) => snapshot,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/dashboard client lagged, skipped {} updates; resyncing", n);
                        store.snapshot().await
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                if !send_snapshot(&mut socket, &snapshot, &mut last_sent).await? {
                    break;
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if r.is_err() || r.unwrap_or(Ok(())).is_err() {
                    break;
                }
            }
        }
    }
    Ok(())
}
