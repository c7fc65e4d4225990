// Library for tests to access modules

pub mod config;
pub mod error;
pub mod ingestor;
pub mod live_channel;
pub mod models;
pub mod routes;
pub mod session;
pub mod snapshot_loader;
pub mod store;
pub mod version;
