//! Keep-alive self-ping task.
//!
//! Free-tier hosts tend to idle-kill processes that receive no traffic; when
//! enabled, the server periodically requests its own /health endpoint so the
//! platform sees activity.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Per-ping request timeout.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Spawns the self-ping loop. The task runs until the process exits.
pub fn start(port: u16, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let client = match reqwest::Client::builder().timeout(PING_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => {
                tracing::error!("Failed to build keep-alive HTTP client: {}", e);
                return;
            }
        };

        let url = format!("http://127.0.0.1:{}/health", port);
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; the server may not be listening yet.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match client.get(&url).send().await {
                Ok(response) => {
                    tracing::debug!("Keep-alive ping: {}", response.status());
                }
                Err(e) => {
                    tracing::warn!("Keep-alive ping failed: {}", e);
                }
            }
        }
    })
}
