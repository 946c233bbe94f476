use std::sync::Arc;
use std::time::Instant;

use ytlink_core::{
    Config, Extractor, KeyRegistry, MediaResolver, ResolvedMedia, ResultCache, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    registry: Arc<KeyRegistry>,
    resolver: MediaResolver,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Config,
        registry: Arc<KeyRegistry>,
        cache: Arc<ResultCache<ResolvedMedia>>,
        extractor: Arc<dyn Extractor>,
    ) -> Self {
        let resolver = MediaResolver::new(cache, extractor);
        Self {
            config,
            registry,
            resolver,
            started_at: Instant::now(),
        }
    }

    pub fn registry(&self) -> &KeyRegistry {
        &self.registry
    }

    pub fn resolver(&self) -> &MediaResolver {
        &self.resolver
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Seconds since the server started.
    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
