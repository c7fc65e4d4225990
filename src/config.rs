use serde::Deserialize;

use crate::store::{DEFAULT_WINDOW_CAPACITY, StoreConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub window: WindowConfig,
    pub publishing: PublishingConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// The monitored service: bulk history endpoint and live push channel.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub snapshot_url: String,
    pub live_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_capacity")]
    pub capacity: usize,
    /// Recent record fingerprints remembered to drop re-sent events; 0 = off.
    #[serde(default)]
    pub dedup_capacity: usize,
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            capacity: default_window_capacity(),
            dedup_capacity: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max dashboard updates buffered per /ws/dashboard client (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (counters, reconnects, ws clients) at INFO level.
    pub stats_log_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            capacity: self.window.capacity,
            dedup_capacity: self.window.dedup_capacity,
            broadcast_capacity: self.publishing.broadcast_capacity,
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.source.snapshot_url.starts_with("http://")
                || self.source.snapshot_url.starts_with("https://"),
            "source.snapshot_url must be an http(s) URL, got {:?}",
            self.source.snapshot_url
        );
        anyhow::ensure!(
            self.source.live_url.starts_with("ws://") || self.source.live_url.starts_with("wss://"),
            "source.live_url must be a ws(s) URL, got {:?}",
            self.source.live_url
        );
        anyhow::ensure!(
            self.source.request_timeout_ms > 0,
            "source.request_timeout_ms must be > 0, got {}",
            self.source.request_timeout_ms
        );
        anyhow::ensure!(
            self.window.capacity > 0,
            "window.capacity must be > 0, got {}",
            self.window.capacity
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.reconnect.initial_delay_ms > 0,
            "reconnect.initial_delay_ms must be > 0, got {}",
            self.reconnect.initial_delay_ms
        );
        anyhow::ensure!(
            self.reconnect.max_delay_ms >= self.reconnect.initial_delay_ms,
            "reconnect.max_delay_ms must be >= reconnect.initial_delay_ms, got {}",
            self.reconnect.max_delay_ms
        );
        Ok(())
    }
}
