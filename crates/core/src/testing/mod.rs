//! Test doubles for the extractor seam.
//!
//! Exported from the library so the server's e2e tests can drive the full
//! router without spawning real tool processes.

mod mock_extractor;

pub use mock_extractor::*;
