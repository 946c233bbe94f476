use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ytlink_core::{
    generate_key, load_config, start_sweeper, validate_config, Extractor, KeyRegistry,
    ResultCache, YtDlpExtractor,
};

use ytlink_server::api::create_router;
use ytlink_server::state::AppState;
use ytlink_server::{keepalive, VERSION};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("YTLINK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration (file is optional, env overrides always apply)
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Compute config hash so deployments can be told apart in logs
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!("Configuration loaded (hash {})", &config_hash[..16]);

    // Bootstrap the key registry. The master key never leaves memory and is
    // never logged; an ephemeral one is generated when none is configured.
    let master_key = match config.auth.master_key.clone() {
        Some(key) => key,
        None => {
            warn!("No master key configured; generated an ephemeral one (issued keys die with the process)");
            generate_key()
        }
    };
    let registry = Arc::new(KeyRegistry::new(master_key, config.auth.api_keys.clone()));
    info!(
        "API keys initialized. Master key length: {}, valid keys: {}",
        registry.master_key_len(),
        registry.key_count().await
    );

    // Result cache with periodic expiry sweep
    let cache = Arc::new(ResultCache::new(Duration::from_secs(config.cache.ttl_secs)));
    start_sweeper(
        Arc::clone(&cache),
        Duration::from_secs(config.cache.sweep_interval_secs),
    );
    info!(
        "Result cache initialized (ttl {}s, sweep every {}s)",
        config.cache.ttl_secs, config.cache.sweep_interval_secs
    );

    // Extraction tool backend. A missing binary is not fatal to the server,
    // only to the requests that need it.
    let extractor: Arc<dyn Extractor> = Arc::new(YtDlpExtractor::new(config.extractor.clone()));
    match extractor.validate().await {
        Ok(()) => info!("Extraction tool validated: {}", extractor.name()),
        Err(e) => warn!("Extraction tool validation failed: {}", e),
    }

    // Keep-alive self-ping
    if config.keepalive.enabled {
        info!(
            "Keep-alive self-ping enabled (every {}s)",
            config.keepalive.interval_secs
        );
        keepalive::start(
            config.server.port,
            Duration::from_secs(config.keepalive.interval_secs),
        );
    }

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), registry, cache, extractor));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting ytlink v{} on {}", VERSION, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
