//! Resolution endpoints: /info, /audio, /video.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use ytlink_core::{
    ExtractorError, OperationKind, Resolution, ResolveError, ResolvedMedia,
};

use crate::metrics::{CACHE_HITS_TOTAL, CACHE_MISSES_TOTAL, EXTRACTION_OUTCOMES_TOTAL};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveParams {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InfoResponse {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration: Option<u64>,
    pub uploader: Option<String>,
    pub formats: usize,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct AudioResponse {
    pub audio_url: String,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub video_url: String,
    pub cached: bool,
}

/// GET /info
pub async fn info(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Response {
    handle(state, OperationKind::Metadata, params).await
}

/// GET /audio
pub async fn audio(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Response {
    handle(state, OperationKind::Audio, params).await
}

/// GET /video
pub async fn video(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveParams>,
) -> Response {
    handle(state, OperationKind::Video, params).await
}

async fn handle(state: Arc<AppState>, kind: OperationKind, params: ResolveParams) -> Response {
    let Some(url) = params.url else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing YouTube URL parameter.".to_string(),
                details: None,
            }),
        )
            .into_response();
    };

    match state.resolver().resolve(kind, &url).await {
        Ok(resolution) => {
            record_success(kind, &resolution);
            success_response(resolution)
        }
        Err(e) => failure_response(kind, e),
    }
}

fn success_response(resolution: Resolution) -> Response {
    let cached = resolution.cached;
    match resolution.media {
        ResolvedMedia::Metadata(meta) => Json(InfoResponse {
            id: meta.id,
            title: meta.title,
            duration: meta.duration,
            uploader: meta.uploader,
            formats: meta.formats,
            cached,
        })
        .into_response(),
        ResolvedMedia::AudioUrl(audio_url) => {
            Json(AudioResponse { audio_url, cached }).into_response()
        }
        ResolvedMedia::VideoUrl(video_url) => {
            Json(VideoResponse { video_url, cached }).into_response()
        }
    }
}

fn failure_response(kind: OperationKind, err: ResolveError) -> Response {
    match err {
        ResolveError::InvalidUrl => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Invalid URL format.".to_string(),
                details: None,
            }),
        )
            .into_response(),
        ResolveError::Extraction(e) if e.is_timeout() => {
            record_outcome(kind, "timeout");
            (
                StatusCode::GATEWAY_TIMEOUT,
                Json(ErrorResponse {
                    error: "Request timeout".to_string(),
                    details: None,
                }),
            )
                .into_response()
        }
        ResolveError::Extraction(e) => {
            record_outcome(kind, outcome_label(&e));
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: failure_message(kind).to_string(),
                    details: e.detail().map(String::from),
                }),
            )
                .into_response()
        }
    }
}

fn failure_message(kind: OperationKind) -> &'static str {
    match kind {
        OperationKind::Metadata => "Failed to fetch video info",
        OperationKind::Audio => "Failed to retrieve audio URL",
        OperationKind::Video => "Failed to retrieve video URL",
    }
}

fn record_success(kind: OperationKind, resolution: &Resolution) {
    if resolution.cached {
        CACHE_HITS_TOTAL.with_label_values(&[kind.as_str()]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[kind.as_str()]).inc();
        record_outcome(kind, "success");
    }
}

fn record_outcome(kind: OperationKind, outcome: &str) {
    EXTRACTION_OUTCOMES_TOTAL
        .with_label_values(&[kind.as_str(), outcome])
        .inc();
}

fn outcome_label(err: &ExtractorError) -> &'static str {
    match err {
        ExtractorError::TimedOut { .. } => "timeout",
        ExtractorError::ToolError { .. } => "tool_error",
        ExtractorError::EmptyOutput => "empty_output",
        ExtractorError::ParseFailure { .. } => "parse_failure",
        ExtractorError::ToolNotFound { .. } | ExtractorError::SpawnFailure { .. } => {
            "spawn_failure"
        }
    }
}
