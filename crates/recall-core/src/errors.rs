//! Error types shared across the Recall crates.

use thiserror::Error;

/// Errors produced by the host's text-generation call.
///
/// Cancellation is distinguished from failure: an aborted generation leaves
/// no error record on the message, a failed one does.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The user stopped generation while the request was in flight.
    #[error("generation aborted")]
    Aborted,
    /// The backend rejected or failed the request.
    #[error("generation failed: {0}")]
    Failed(String),
    /// The backend returned an empty result.
    #[error("generation returned an empty result")]
    Empty,
}

impl GenerationError {
    /// Whether this error represents a user-initiated stop rather than a
    /// backend failure.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
