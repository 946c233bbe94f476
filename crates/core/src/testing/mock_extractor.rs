//! Mock extractor for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::extractor::{
    Extraction, ExtractorError, Extractor, MediaMetadata, OperationKind,
};

/// Scripted outcome for one (operation, URL) pair.
///
/// `ExtractorError` is not `Clone` (it can wrap an `io::Error`), so the
/// script stores a clonable description and rebuilds a fresh error on every
/// call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Metadata(MediaMetadata),
    StreamUrl(String),
    TimedOut { timeout_secs: u64 },
    ToolError {
        exit_code: Option<i32>,
        stderr: String,
    },
    EmptyOutput,
    SpawnFailure,
}

impl MockOutcome {
    fn to_result(&self) -> Result<Extraction, ExtractorError> {
        match self {
            Self::Metadata(meta) => Ok(Extraction::Metadata(meta.clone())),
            Self::StreamUrl(url) => Ok(Extraction::StreamUrl(url.clone())),
            Self::TimedOut { timeout_secs } => Err(ExtractorError::TimedOut {
                timeout_secs: *timeout_secs,
            }),
            Self::ToolError { exit_code, stderr } => Err(ExtractorError::ToolError {
                exit_code: *exit_code,
                stderr: stderr.clone(),
            }),
            Self::EmptyOutput => Err(ExtractorError::EmptyOutput),
            Self::SpawnFailure => Err(ExtractorError::SpawnFailure {
                source: std::io::Error::other("scripted spawn failure"),
            }),
        }
    }
}

/// Mock implementation of the Extractor trait.
///
/// Provides controllable behavior for testing:
/// - Script outcomes per (operation, URL) pair, or a default for anything
///   unscripted
/// - Record calls for assertions on invocation counts
#[derive(Debug, Default)]
pub struct MockExtractor {
    responses: RwLock<HashMap<(OperationKind, String), MockOutcome>>,
    default_outcome: RwLock<Option<MockOutcome>>,
    calls: RwLock<Vec<(OperationKind, String)>>,
}

impl MockExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the outcome for one (operation, URL) pair.
    pub async fn set_response(&self, kind: OperationKind, url: &str, outcome: MockOutcome) {
        self.responses
            .write()
            .await
            .insert((kind, url.to_string()), outcome);
    }

    /// Script the outcome for any unmatched call.
    pub async fn set_default(&self, outcome: MockOutcome) {
        *self.default_outcome.write().await = Some(outcome);
    }

    /// All calls made so far, in order.
    pub async fn recorded_calls(&self) -> Vec<(OperationKind, String)> {
        self.calls.read().await.clone()
    }

    /// Number of extract calls made so far.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    fn name(&self) -> &str {
        "mock"
    }

    async fn extract(
        &self,
        kind: OperationKind,
        url: &str,
    ) -> Result<Extraction, ExtractorError> {
        self.calls.write().await.push((kind, url.to_string()));

        if let Some(outcome) = self.responses.read().await.get(&(kind, url.to_string())) {
            return outcome.to_result();
        }
        if let Some(outcome) = self.default_outcome.read().await.as_ref() {
            return outcome.to_result();
        }

        Err(ExtractorError::ToolError {
            exit_code: Some(1),
            stderr: format!("no scripted response for {} {}", kind, url),
        })
    }

    async fn validate(&self) -> Result<(), ExtractorError> {
        Ok(())
    }
}
