// Live push channel transport: a WebSocket carrying `{type, data}` text envelopes.

use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::{DashboardError, Result};

pub type LiveStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Max time for the TCP + WebSocket handshake before the attempt counts as failed.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens the live channel. Any failure is reported as `ChannelClosed` so the session
/// owner treats it the same as a dropped connection.
pub async fn connect(url: &str) -> Result<LiveStream> {
    match timeout(CONNECT_TIMEOUT, connect_async(url)).await {
        Ok(Ok((stream, response))) => {
            tracing::debug!(url, status = %response.status(), "live channel handshake complete");
            Ok(stream)
        }
        Ok(Err(e)) => Err(DashboardError::ChannelClosed(format!("connect {}: {}", url, e))),
        Err(_) => Err(DashboardError::ChannelClosed(format!(
            "connect {}: timed out after {:?}",
            url, CONNECT_TIMEOUT
        ))),
    }
}
