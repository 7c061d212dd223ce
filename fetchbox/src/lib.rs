#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Request orchestration.
///
/// This module provides [`Client`], the caching request orchestrator, and
/// the [`Fetcher`] capability trait custom variants decorate.
pub mod client;

/// Error types for orchestrated requests.
///
/// Defines [`Error`] which covers:
/// - Configuration errors (cache directive without a store, invalid
///   retry delay)
/// - Retry exhaustion, carrying the last observed envelope
/// - Cache backend failures
/// - Transport failures below the HTTP layer
pub mod error;

/// Detached background task execution.
///
/// The lifecycle override path fires the real network dispatch through
/// the [`OffloadManager`](offload::OffloadManager); its result updates the
/// cache but is never awaited by the original caller.
pub mod offload;

mod retry;

/// Default transport over reqwest.
pub mod transport;

pub use client::{Client, ClientBuilder, Fetcher, default_request_options};
pub use error::{ConfigError, Error};
pub use offload::OffloadManager;
pub use transport::ReqwestTransport;

pub use fetchbox_backend::{Backend, BackendError, BackendResult, CacheStore, DeleteStatus};
pub use fetchbox_core::{
    CacheDirective, CacheEntry, CacheKey, InterceptorConfig, Lifecycle, OverrideDecision,
    RequestInterceptor, RequestOptions, ResponseEnvelope, ResponseInterceptor, RetryDirective,
    Transport, TransportError, TransportRequest, TransportResponse,
};

/// The fetchbox prelude.
///
/// ```rust
/// use fetchbox::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CacheDirective, Client, Error, Fetcher, RequestOptions, ResponseEnvelope, RetryDirective,
    };
}
