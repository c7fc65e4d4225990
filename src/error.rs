// Error taxonomy for the sync engine. None of these is fatal to the process.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    /// Bulk retrieval failed or returned malformed data; session runs live-only.
    #[error("snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    /// Live message did not parse as an envelope or record; it is discarded.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Live channel ended; the session owner decides whether to reconnect.
    #[error("live channel closed: {0}")]
    ChannelClosed(String),

    #[error("store already initialized from a snapshot")]
    AlreadyInitialized,

    #[error("live event received before snapshot phase completed")]
    NotInitialized,

    #[error("duplicate event dropped")]
    DuplicateEvent,

    #[error("session closed")]
    SessionClosed,
}

pub type Result<T> = std::result::Result<T, DashboardError>;
