//! Time-bounded in-memory result cache.

use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Process-local key-value cache with a fixed time-to-live.
///
/// Expiry is checked on every read, never only by the background sweep, so
/// an entry is never served after its TTL has elapsed. The sweep exists to
/// bound memory under sustained unique-key traffic; correctness does not
/// depend on it.
///
/// Keys are exact strings. Callers build them as `"{operation}:{url}"` with
/// no URL normalization, so near-duplicate URLs occupy distinct entries.
pub struct ResultCache<V> {
    ttl: Duration,
    entries: RwLock<HashMap<String, Entry<V>>>,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the live value for `key`, or `None` if absent or expired.
    /// Expired entries are left in place for the sweep.
    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if entry.inserted_at.elapsed() >= self.ttl {
            return None;
        }
        Some(entry.value.clone())
    }

    /// Inserts or overwrites; the TTL window restarts from now.
    pub async fn put(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Removes expired entries, returning how many were dropped.
    pub async fn sweep(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Number of entries currently stored, expired ones included until swept.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

/// Spawns the periodic sweep task for `cache`.
///
/// The task runs until the process exits; it holds its own reference to the
/// cache and never needs to be joined.
pub fn start_sweeper<V: Clone + Send + Sync + 'static>(
    cache: std::sync::Arc<ResultCache<V>>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so sweeps start one interval in.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep().await;
            if removed > 0 {
                tracing::debug!("Cache sweep removed {} expired entries", removed);
            }
        }
    })
}
