//! Error types for the extractor module.

use std::path::PathBuf;
use thiserror::Error;

/// Terminal failure states of one tool invocation.
///
/// Every invocation ends in exactly one of these or a success; there is no
/// retry at this level. Raw process and stream errors never cross this
/// boundary.
#[derive(Debug, Error)]
pub enum ExtractorError {
    /// Extraction tool binary not found.
    #[error("Extraction tool not found at path: {path}")]
    ToolNotFound { path: PathBuf },

    /// The tool could not be spawned or its lifecycle could not be driven
    /// (permission denied, pipe failure). Fatal to the request, not the
    /// process.
    #[error("Failed to run extraction tool: {source}")]
    SpawnFailure {
        #[from]
        source: std::io::Error,
    },

    /// The deadline elapsed before the tool exited; the process was killed
    /// and any partial output discarded.
    #[error("Extraction timed out after {timeout_secs} seconds")]
    TimedOut { timeout_secs: u64 },

    /// The tool exited with a nonzero code. Carries a truncated stderr
    /// excerpt for diagnostics.
    #[error("Extraction tool exited with code {exit_code:?}")]
    ToolError {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The tool exited cleanly but produced no output.
    #[error("Extraction tool produced no output")]
    EmptyOutput,

    /// The tool's output could not be parsed for the requested operation.
    #[error("Failed to parse extraction output: {reason}")]
    ParseFailure { reason: String },
}

impl ExtractorError {
    /// Diagnostic detail attached to the failure, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::ToolError { stderr, .. } if !stderr.is_empty() => Some(stderr),
            Self::ParseFailure { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether this failure is the timeout classification, which the HTTP
    /// layer reports as 504 rather than 500.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }
}
