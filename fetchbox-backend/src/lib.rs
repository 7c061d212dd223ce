//! Cache store contract for the fetchbox caching HTTP client.
//!
//! Defines the object-safe [`Backend`] storage primitive, the typed
//! [`CacheStore`] extension implemented for every backend, and the shared
//! [`BackendError`] taxonomy.

#![warn(missing_docs)]

/// Cache store traits.
pub mod backend;

/// Error types for cache store operations.
pub mod error;

pub use backend::{Backend, BackendResult, CacheStore, DeleteStatus};
pub use error::{BackendError, BoxError};

pub use fetchbox_core::{CacheEntry, CacheKey};
