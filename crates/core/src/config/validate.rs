use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Cache TTL and sweep interval are sane (sweep must run at least once
///   per minute so expired entries do not pile up under unique-URL traffic)
/// - Extraction timeouts and output caps are nonzero
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Cache validation
    if config.cache.ttl_secs == 0 {
        return Err(ConfigError::ValidationError(
            "cache.ttl_secs cannot be 0".to_string(),
        ));
    }
    if config.cache.sweep_interval_secs == 0 || config.cache.sweep_interval_secs > 60 {
        return Err(ConfigError::ValidationError(
            "cache.sweep_interval_secs must be between 1 and 60".to_string(),
        ));
    }

    // Extractor validation
    let ex = &config.extractor;
    for (name, value) in [
        ("extractor.metadata_timeout_secs", ex.metadata_timeout_secs),
        ("extractor.audio_timeout_secs", ex.audio_timeout_secs),
        ("extractor.video_timeout_secs", ex.video_timeout_secs),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be 0",
                name
            )));
        }
    }
    if ex.metadata_max_output_bytes == 0 || ex.stream_max_output_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "extractor output caps cannot be 0".to_string(),
        ));
    }

    Ok(())
}
