pub mod api;
pub mod keepalive;
pub mod metrics;
pub mod state;

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
