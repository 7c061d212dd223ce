//! Request descriptor and per-request directives.
//!
//! [`RequestOptions`] describes one outgoing call: method, path, headers,
//! body, plus the optional cache, retry, interceptor, and lifecycle
//! directives that drive orchestration. The descriptor is transient,
//! scoped to a single orchestration call, and travels inside the returned
//! [`ResponseEnvelope`](crate::ResponseEnvelope).
//!
//! Hooks and interceptors are runtime-only state and are skipped when a
//! descriptor is serialized into a stored envelope.

use std::sync::Arc;
use std::time::Duration;

use http::{HeaderMap, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::interceptor::InterceptorConfig;
use crate::key::CacheKey;
use crate::lifecycle::Lifecycle;

/// Cache directive for a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    /// Key the response envelope is stored under.
    pub key: CacheKey,
    /// Time-to-live for the stored envelope. `None` means the entry never
    /// expires; this is also the orchestrator's default when unspecified.
    #[serde(default, with = "humantime_serde")]
    pub ttl: Option<Duration>,
    /// Bypass the cache read and dispatch anyway. The fresh result still
    /// overwrites whatever is stored under `key`.
    #[serde(default)]
    pub force: bool,
}

impl CacheDirective {
    /// Creates a directive with an unbounded ttl.
    pub fn new(key: impl Into<CacheKey>) -> Self {
        CacheDirective {
            key: key.into(),
            ttl: None,
            force: false,
        }
    }

    /// Sets a bounded ttl.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Bypasses the cache read for this call.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Retry directive for a single request.
///
/// `attempts` is the total dispatch budget, the initial send included; a
/// directive with `attempts: 3` allows the initial dispatch plus two
/// resends. `delay` is the fixed wait before every resend — no backoff,
/// no jitter. The orchestrator rejects a zero delay with a configuration
/// error before attempting any resend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryDirective {
    /// Total dispatch budget, including the initial send.
    pub attempts: u32,
    /// Fixed delay before each resend.
    #[serde(with = "humantime_serde")]
    pub delay: Duration,
}

impl RetryDirective {
    /// Creates a retry directive.
    pub fn new(attempts: u32, delay: Duration) -> Self {
        RetryDirective { attempts, delay }
    }
}

/// Descriptor for one outgoing request.
///
/// Construct with [`RequestOptions::new`] and the chainable setters, or
/// with struct-update syntax over [`Default::default`]:
///
/// ```
/// use fetchbox_core::{CacheDirective, RequestOptions};
/// use http::Method;
///
/// let options = RequestOptions::new(Method::GET, "/hello")
///     .cache(CacheDirective::new("hello"));
/// assert_eq!(options.path, "/hello");
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP method.
    #[serde(with = "http_serde::method")]
    pub method: Method,
    /// Request path, joined onto the instance origin (or `origin` below).
    pub path: String,
    /// Per-call origin override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Request headers.
    #[serde(default, with = "http_serde::header_map")]
    pub headers: HeaderMap,
    /// JSON request body. Ignored for GET requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Cache directive, if the response should be served from / written to
    /// a cache store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheDirective>,
    /// Retry directive, if failed dispatches should be resent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryDirective>,
    /// Per-call interceptors, appended after instance-level ones.
    #[serde(skip)]
    pub interceptors: InterceptorConfig,
    /// Request-lifecycle override hook.
    #[serde(skip)]
    pub lifecycle: Option<Arc<dyn Lifecycle>>,
}

impl RequestOptions {
    /// Creates a descriptor for `method` and `path`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RequestOptions {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    /// Sets the per-call origin override.
    pub fn origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the request headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the JSON request body.
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the cache directive.
    pub fn cache(mut self, cache: CacheDirective) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the retry directive.
    pub fn retry(mut self, retry: RetryDirective) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the interceptor configuration.
    pub fn interceptors(mut self, interceptors: InterceptorConfig) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Sets the lifecycle override hook.
    pub fn lifecycle(mut self, lifecycle: Arc<dyn Lifecycle>) -> Self {
        self.lifecycle = Some(lifecycle);
        self
    }

    /// Merges instance-level defaults under this descriptor.
    ///
    /// Per-call values win on conflict: scalar fields keep the per-call
    /// value when set, headers are unioned with per-call entries taking
    /// precedence per header name. Method and path are always per-call.
    /// Interceptor chains are not merged here; the orchestrator
    /// concatenates them so instance-level interceptors run first.
    pub fn merged_over(mut self, defaults: &RequestOptions) -> Self {
        if self.origin.is_none() {
            self.origin = defaults.origin.clone();
        }
        if self.body.is_none() {
            self.body = defaults.body.clone();
        }
        if self.cache.is_none() {
            self.cache = defaults.cache.clone();
        }
        if self.retry.is_none() {
            self.retry = defaults.retry.clone();
        }
        if self.lifecycle.is_none() {
            self.lifecycle = defaults.lifecycle.clone();
        }
        if !defaults.headers.is_empty() {
            let mut headers = defaults.headers.clone();
            for (name, value) in &self.headers {
                headers.insert(name.clone(), value.clone());
            }
            self.headers = headers;
        }
        self
    }
}

impl std::fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestOptions")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("origin", &self.origin)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("cache", &self.cache)
            .field("retry", &self.retry)
            .field("interceptors", &self.interceptors)
            .field("lifecycle", &self.lifecycle.as_ref().map(|_| "..."))
            .finish()
    }
}
