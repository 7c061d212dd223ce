//! Error types for cache store operations.

use thiserror::Error;

/// Boxed source error.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for cache store operations.
///
/// A missing key is never an error: reads resolve to `Ok(None)` and
/// deletes to [`DeleteStatus::Missing`](crate::DeleteStatus::Missing).
/// Errors are reserved for a store that could not answer at all, and the
/// orchestrator surfaces them to the caller rather than downgrading them
/// to cache misses.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is unreachable: connection refused, timed out, or lost.
    #[error("cache backend unavailable: {0}")]
    Connection(#[source] BoxError),

    /// Internal backend error, state or computation error.
    #[error(transparent)]
    Internal(BoxError),

    /// Entry serialization or deserialization error.
    #[error("cache entry codec error: {0}")]
    Format(#[from] serde_json::Error),
}
