//! Authentication and metrics middleware for API routes.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::metrics::{
    normalize_path, AUTH_FAILURES_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
};
use crate::state::AppState;

/// Error body for authorization failures: a short machine-readable error
/// plus a human-readable hint.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct KeyParams {
    #[serde(default)]
    key: Option<String>,
}

/// Metrics middleware that tracks HTTP request duration and counts.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());

    HTTP_REQUESTS_IN_FLIGHT.inc();

    let response = next.run(request).await;

    HTTP_REQUESTS_IN_FLIGHT.dec();

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUEST_DURATION
        .with_label_values(&[&method, path, &status])
        .observe(duration);
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, path, &status])
        .inc();

    response
}

/// Authorization gate for the resolution endpoints.
///
/// The candidate key is taken from, in priority order: the `key` query
/// parameter, the `X-API-Key` header, an `Authorization: Bearer` header.
/// A missing key is 401, a key not in the registry is 403. Health, root and
/// metrics routes never pass through this layer.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    Query(params): Query<KeyParams>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<AuthErrorResponse>)> {
    let key = params.key.or_else(|| extract_header_key(&request));

    let Some(key) = key else {
        AUTH_FAILURES_TOTAL.with_label_values(&["missing_key"]).inc();
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse {
                error: "Missing API key".to_string(),
                message:
                    "Provide key as query parameter (?key=YOUR_KEY) or header (X-API-Key: YOUR_KEY)"
                        .to_string(),
            }),
        ));
    };

    if !state.registry().is_valid(&key).await {
        let prefix: String = key.chars().take(10).collect();
        tracing::warn!("Invalid API key attempt: {}...", prefix);
        AUTH_FAILURES_TOTAL.with_label_values(&["invalid_key"]).inc();
        return Err((
            StatusCode::FORBIDDEN,
            Json(AuthErrorResponse {
                error: "Invalid API key".to_string(),
                message: "The provided API key is not valid".to_string(),
            }),
        ));
    }

    Ok(next.run(request).await)
}

/// Extract an API key from request headers.
/// Checks X-API-Key and Authorization: Bearer headers.
fn extract_header_key(request: &Request<Body>) -> Option<String> {
    if let Some(value) = request.headers().get("x-api-key") {
        if let Ok(key) = value.to_str() {
            return Some(key.to_string());
        }
    }

    if let Some(value) = request.headers().get("authorization") {
        if let Ok(auth_header) = value.to_str() {
            if let Some(key) = auth_header.strip_prefix("Bearer ") {
                return Some(key.to_string());
            }
            // Also support lowercase
            if let Some(key) = auth_header.strip_prefix("bearer ") {
                return Some(key.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_headers(headers: Vec<(&str, &str)>) -> Request<Body> {
        let mut builder = Request::builder().uri("/info");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_extract_x_api_key_header() {
        let request = request_with_headers(vec![("X-API-Key", "secret")]);
        assert_eq!(extract_header_key(&request).as_deref(), Some("secret"));
    }

    #[test]
    fn test_extract_bearer_token() {
        let request = request_with_headers(vec![("Authorization", "Bearer secret")]);
        assert_eq!(extract_header_key(&request).as_deref(), Some("secret"));
    }

    #[test]
    fn test_extract_bearer_lowercase() {
        let request = request_with_headers(vec![("Authorization", "bearer secret")]);
        assert_eq!(extract_header_key(&request).as_deref(), Some("secret"));
    }

    #[test]
    fn test_x_api_key_takes_priority_over_bearer() {
        let request = request_with_headers(vec![
            ("X-API-Key", "from-header"),
            ("Authorization", "Bearer from-bearer"),
        ]);
        assert_eq!(extract_header_key(&request).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_extract_no_key() {
        let request = request_with_headers(vec![]);
        assert_eq!(extract_header_key(&request), None);
    }
}
