use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::middleware::{auth_middleware, metrics_middleware};
use super::{handlers, resolve};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Resolution endpoints sit behind the authorization gate; everything
    // else is public by design (the mint endpoint carries its own narrower
    // gate inside the handler).
    let protected = Router::new()
        .route("/info", get(resolve::info))
        .route("/audio", get(resolve::audio))
        .route("/video", get(resolve::video))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .route("/generate-key", get(handlers::generate_key))
        .merge(protected)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
