//! Common test utilities for E2E testing with a mock extractor.
//!
//! Builds the real router in-process so tests exercise routing, the
//! authorization gate and the resolution handlers without spawning tool
//! processes or binding a socket.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ytlink_core::testing::MockExtractor;
use ytlink_core::{Config, Extractor, KeyRegistry, ResultCache};
use ytlink_server::api::create_router;
use ytlink_server::state::AppState;

/// Master key wired into every fixture.
pub const MASTER_KEY: &str = "e2e-master-key";

/// Standard key wired into every fixture.
pub const API_KEY: &str = "e2e-standard-key";

/// Test fixture with the full router over controllable mocks.
pub struct TestFixture {
    pub router: Router,
    /// Mock extractor - script per-URL outcomes.
    pub extractor: Arc<MockExtractor>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let mut config = Config::default();
        config.auth.master_key = Some(MASTER_KEY.to_string());
        config.auth.api_keys = vec![API_KEY.to_string()];

        let registry = Arc::new(KeyRegistry::new(
            MASTER_KEY.to_string(),
            vec![API_KEY.to_string()],
        ));
        let cache = Arc::new(ResultCache::new(Duration::from_secs(config.cache.ttl_secs)));
        let extractor = Arc::new(MockExtractor::new());

        let state = Arc::new(AppState::new(
            config,
            registry,
            cache,
            Arc::clone(&extractor) as Arc<dyn Extractor>,
        ));

        Self {
            router: create_router(state),
            extractor,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.get_with_headers(path, &[]).await
    }

    /// Send a GET request with extra headers.
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        let (status, body_bytes) = self.send(path, headers).await;

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }

    /// Send a GET request and return the raw body as text (for /metrics).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let (status, body_bytes) = self.send(path, &[]).await;
        (status, String::from_utf8_lossy(&body_bytes).into_owned())
    }

    async fn send(&self, path: &str, headers: &[(&str, &str)]) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method("GET").uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        (status, body_bytes)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
