// Domain models: wire records and dashboard read models

mod dashboard;
mod record;

pub use dashboard::{Aggregates, DashboardSnapshot, StorePhase};
pub use record::{Envelope, LogsResponse, NEW_REQUEST_EVENT, Record, RecordFingerprint};
