//! Public endpoints: health, service description, key minting, metrics.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::middleware::AuthErrorResponse;
use crate::metrics;
use crate::state::AppState;
use crate::VERSION;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: u64,
    pub version: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "alive".to_string(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_secs(),
        version: VERSION.to_string(),
    })
}

#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub version: String,
    pub requires_auth: bool,
    pub endpoints: EndpointList,
    pub auth: AuthMethods,
}

#[derive(Debug, Serialize)]
pub struct EndpointList {
    pub health: String,
    pub info: String,
    pub audio: String,
    pub video: String,
    #[serde(rename = "generate-key")]
    pub generate_key: String,
}

#[derive(Debug, Serialize)]
pub struct AuthMethods {
    pub method: String,
    pub query_param: String,
    pub header: String,
    pub bearer: String,
}

pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        message: "YouTube media link resolution API".to_string(),
        version: VERSION.to_string(),
        requires_auth: true,
        endpoints: EndpointList {
            health: "/health (no auth required)".to_string(),
            info: "/info?url=<youtube_url>&key=<api_key>".to_string(),
            audio: "/audio?url=<youtube_url>&key=<api_key>".to_string(),
            video: "/video?url=<youtube_url>&key=<api_key>".to_string(),
            generate_key: "/generate-key?master_key=<master_key>".to_string(),
        },
        auth: AuthMethods {
            method: "Query parameter or Header".to_string(),
            query_param: "key=YOUR_API_KEY".to_string(),
            header: "X-API-Key: YOUR_API_KEY".to_string(),
            bearer: "Authorization: Bearer YOUR_API_KEY".to_string(),
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct GenerateKeyParams {
    #[serde(default)]
    master_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateKeyResponse {
    pub success: bool,
    pub message: String,
    pub api_key: String,
    pub expires: String,
}

/// GET /generate-key
///
/// Mints a new standard API key. Guarded by its own narrow gate: only the
/// master key is accepted, from the `master_key` query parameter or the
/// X-Master-Key header.
pub async fn generate_key(
    State(state): State<Arc<AppState>>,
    Query(params): Query<GenerateKeyParams>,
    headers: HeaderMap,
) -> Result<Json<GenerateKeyResponse>, (StatusCode, Json<AuthErrorResponse>)> {
    let master_key = params.master_key.or_else(|| {
        headers
            .get("x-master-key")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    });

    let Some(master_key) = master_key else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(AuthErrorResponse {
                error: "Missing master key".to_string(),
                message: "Provide master_key as query parameter or X-Master-Key header"
                    .to_string(),
            }),
        ));
    };

    match state.registry().issue_key(&master_key).await {
        Ok(api_key) => Ok(Json(GenerateKeyResponse {
            success: true,
            message: "New API key generated successfully".to_string(),
            api_key,
            expires: "Never (stored in memory, resets on restart)".to_string(),
        })),
        Err(_) => {
            tracing::warn!("Invalid master key attempt");
            Err((
                StatusCode::FORBIDDEN,
                Json(AuthErrorResponse {
                    error: "Invalid master key".to_string(),
                    message: "The provided master key is not valid".to_string(),
                }),
            ))
        }
    }
}

pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render(),
    )
}
