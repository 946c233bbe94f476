use async_trait::async_trait;

use super::error::ExtractorError;
use super::types::{Extraction, OperationKind};

/// A media extraction backend.
///
/// One `extract` call owns one tool invocation from spawn to terminal state;
/// the call suspends until the tool exits or its deadline fires. Retry
/// policy, if any, belongs to the caller.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Name of this extractor backend.
    fn name(&self) -> &str;

    /// Runs the tool for one operation against one URL.
    async fn extract(&self, kind: OperationKind, url: &str)
        -> Result<Extraction, ExtractorError>;

    /// Checks that the backend is usable (e.g. the tool binary exists).
    async fn validate(&self) -> Result<(), ExtractorError>;
}
