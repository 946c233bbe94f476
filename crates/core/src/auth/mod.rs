mod registry;

pub use registry::*;

use thiserror::Error;

/// Authorization failures, mapped by the HTTP layer to 401/403.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No key was supplied with the request.
    #[error("Missing API key")]
    MissingKey,

    /// A key was supplied but is not in the registry.
    #[error("Invalid API key")]
    InvalidKey,
}
