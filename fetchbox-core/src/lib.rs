//! Core types and traits for the fetchbox caching HTTP client.
//!
//! This crate defines the vocabulary shared by the orchestrator and the
//! cache backends: cached entries and keys, the request descriptor and
//! response envelope, interceptor chains, the lifecycle override hook,
//! and the transport seam.

#![warn(missing_docs)]

/// Interceptor traits and chain application.
pub mod interceptor;

/// Cache key type.
pub mod key;

/// Request-lifecycle override hook.
pub mod lifecycle;

/// Request descriptor and per-request directives.
pub mod request;

/// Response envelope type.
pub mod response;

/// Transport seam consumed by the orchestrator.
pub mod transport;

/// Cached entry type with expiration metadata.
pub mod value;

pub use interceptor::{
    InterceptorConfig, RequestInterceptor, ResponseInterceptor, chain_request_interceptors,
    chain_response_interceptors,
};
pub use key::CacheKey;
pub use lifecycle::{Lifecycle, OverrideDecision};
pub use request::{CacheDirective, RequestOptions, RetryDirective};
pub use response::ResponseEnvelope;
pub use transport::{Transport, TransportError, TransportRequest, TransportResponse};
pub use value::CacheEntry;
