//! Error types for orchestrated requests.
//!
//! Configuration and retry-exhaustion errors surface directly to the
//! caller. Backend errors from the cache store also surface — a cache
//! outage is never downgraded to a cache miss, since silently bypassing
//! the store would turn every call into upstream traffic. Body-parse
//! failures are not errors at all: the envelope's `data` degrades to
//! null and the request still completes.

use fetchbox_backend::BackendError;
use fetchbox_core::{ResponseEnvelope, TransportError};
use thiserror::Error;

/// Error type for orchestrated requests.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was misconfigured; nothing was dispatched for the
    /// failing concern.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every dispatch in the retry budget failed.
    #[error("retries exhausted after {attempts} attempts")]
    RetriesExhausted {
        /// The configured dispatch budget.
        attempts: u32,
        /// Envelope assembled from the last observed response.
        last: Box<ResponseEnvelope>,
    },

    /// The cache store could not answer.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The transport failed below the HTTP layer.
    #[error("transport error: {0}")]
    Transport(#[source] TransportError),
}

/// Configuration errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A cache directive was given but the client has no cache store.
    #[error("request has a cache directive but no cache store is configured")]
    CacheStoreNotConfigured,

    /// The retry directive's delay is not strictly positive.
    #[error("retry delay must be a positive duration")]
    InvalidRetryDelay,
}
