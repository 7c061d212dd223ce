//! Request orchestration.
//!
//! [`Client`] composes the cache store, interceptor chains, retry driver,
//! and lifecycle override around a [`Transport`]. One call moves through:
//! default merge → request interceptors → cache check → lifecycle hook →
//! dispatch with retry → envelope assembly → cache write → response
//! interceptors.
//!
//! Multiple calls may be in flight concurrently against the same store,
//! including for the same cache key; no per-key coalescing is performed
//! and the later cache write wins.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use fetchbox_backend::{Backend, CacheStore};
use fetchbox_core::{
    CacheKey, InterceptorConfig, OverrideDecision, RequestInterceptor, RequestOptions,
    ResponseEnvelope, ResponseInterceptor, RetryDirective, Transport, TransportRequest,
    TransportResponse, chain_request_interceptors, chain_response_interceptors,
};
use http::Method;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ConfigError, Error};
use crate::offload::OffloadManager;
use crate::retry::{Dispatched, dispatch_with_retry};
use crate::transport::ReqwestTransport;

/// Capability surface of a request orchestrator.
///
/// `Client` implements it directly; custom variants wrap or decorate an
/// existing implementation rather than subclass one. The convenience
/// wrappers set the method and path, then defer to [`Fetcher::request`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Orchestrates one request.
    async fn request(&self, options: RequestOptions) -> Result<ResponseEnvelope, Error>;

    /// Force-deletes the entry stored under `key`, reporting whether one
    /// was present. Fails with a configuration error when no cache store
    /// is configured.
    async fn invalidate(&self, key: &CacheKey) -> Result<bool, Error>;

    /// GET `path`.
    async fn get(&self, path: &str, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.request(with_route(options, Method::GET, path)).await
    }

    /// POST `path`.
    async fn post(&self, path: &str, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.request(with_route(options, Method::POST, path)).await
    }

    /// PUT `path`.
    async fn put(&self, path: &str, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.request(with_route(options, Method::PUT, path)).await
    }

    /// PATCH `path`.
    async fn patch(&self, path: &str, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.request(with_route(options, Method::PATCH, path)).await
    }

    /// DELETE `path`.
    async fn delete(&self, path: &str, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.request(with_route(options, Method::DELETE, path))
            .await
    }
}

fn with_route(mut options: RequestOptions, method: Method, path: &str) -> RequestOptions {
    options.method = method;
    options.path = path.to_owned();
    options
}

/// Request options in the shape most callers start from: a JSON
/// content-type and a small fixed-delay retry budget.
pub fn default_request_options() -> RequestOptions {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    RequestOptions::default()
        .headers(headers)
        .retry(RetryDirective::new(3, Duration::from_secs(2)))
}

/// Instance-level and per-call chains concatenated in order.
struct MergedChains {
    request: Vec<Arc<dyn RequestInterceptor>>,
    response: Vec<Arc<dyn ResponseInterceptor>>,
    execute_on_cached: bool,
}

/// Caching HTTP request client.
///
/// # Examples
///
/// ```no_run
/// use fetchbox::{Client, Fetcher};
/// use fetchbox_core::{CacheDirective, RequestOptions};
/// use fetchbox_memory::MemoryBackend;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), fetchbox::Error> {
/// let client = Client::builder("https://api.example.com")
///     .cache(MemoryBackend::new())
///     .build();
///
/// let options = RequestOptions::default()
///     .cache(CacheDirective::new("hello").ttl(Duration::from_secs(60)));
/// let first = client.get("/hello", options.clone()).await?;
/// assert!(!first.cached);
/// let second = client.get("/hello", options).await?;
/// assert!(second.cached);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    origin: String,
    store: Option<Arc<dyn Backend>>,
    transport: Arc<dyn Transport>,
    interceptors: InterceptorConfig,
    defaults: Option<RequestOptions>,
    offload: OffloadManager,
}

impl Client {
    /// Creates a client without a cache store, over the default reqwest
    /// transport.
    pub fn new(origin: impl Into<String>) -> Self {
        Self::builder(origin).build()
    }

    /// Creates a builder.
    pub fn builder(origin: impl Into<String>) -> ClientBuilder {
        ClientBuilder {
            origin: origin.into(),
            store: None,
            transport: None,
            interceptors: InterceptorConfig::default(),
            defaults: None,
        }
    }

    /// The configured cache store, if any.
    pub fn store(&self) -> Option<&Arc<dyn Backend>> {
        self.store.as_ref()
    }

    /// Manager for the detached background dispatches fired by lifecycle
    /// overrides.
    pub fn offload(&self) -> &OffloadManager {
        &self.offload
    }

    fn merged_chains(&self, call: &InterceptorConfig) -> MergedChains {
        let mut request = self.interceptors.request.clone();
        request.extend(call.request.iter().cloned());
        let mut response = self.interceptors.response.clone();
        response.extend(call.response.iter().cloned());
        MergedChains {
            request,
            response,
            execute_on_cached: self.interceptors.execute_on_cached || call.execute_on_cached,
        }
    }

    fn transport_request(&self, options: &RequestOptions) -> Result<TransportRequest, Error> {
        let origin = options.origin.as_deref().unwrap_or(&self.origin);
        let url = format!(
            "{}/{}",
            origin.trim_end_matches('/'),
            options.path.trim_start_matches('/')
        );
        let mut headers = options.headers.clone();
        // GET requests carry no body.
        let body = match (&options.body, options.method == Method::GET) {
            (Some(body), false) => {
                let bytes =
                    serde_json::to_vec(body).map_err(|error| Error::Transport(Box::new(error)))?;
                if !headers.contains_key(CONTENT_TYPE) {
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
                Some(Bytes::from(bytes))
            }
            _ => None,
        };
        Ok(TransportRequest {
            url,
            method: options.method.clone(),
            headers,
            body,
        })
    }

    /// Dispatch with retry and assemble the envelope. No cache traffic,
    /// no interceptors; shared by the foreground and background paths.
    async fn perform(&self, options: &RequestOptions) -> Result<ResponseEnvelope, Error> {
        let request = self.transport_request(options)?;
        match dispatch_with_retry(self.transport.as_ref(), &request, options.retry.as_ref()).await?
        {
            Dispatched::Completed(response) => Ok(assemble(&response, options)),
            Dispatched::Exhausted { attempts, last } => Err(Error::RetriesExhausted {
                attempts,
                last: Box::new(assemble(&last, options)),
            }),
        }
    }

    async fn write_back(
        &self,
        options: &RequestOptions,
        envelope: &ResponseEnvelope,
    ) -> Result<(), Error> {
        if let (Some(directive), Some(store)) = (&options.cache, &self.store) {
            // Unspecified ttl stores the envelope without expiration.
            store.set(&directive.key, envelope, directive.ttl).await?;
        }
        Ok(())
    }

    async fn force_return(
        &self,
        options: RequestOptions,
        data: Value,
        chains: &MergedChains,
    ) -> Result<ResponseEnvelope, Error> {
        debug!(path = %options.path, "lifecycle hook forced a synthesized return");
        let envelope = ResponseEnvelope::new(true, data, false, options.clone());
        let envelope = chain_response_interceptors(envelope, &chains.response).await;

        // Persist the synthesized envelope before the background dispatch
        // gets a chance to write, so its real result is never overwritten
        // by the optimistic one.
        self.write_back(&options, &envelope).await?;

        // The real dispatch continues detached. Its success determines
        // what ultimately stays persisted; its failures never reach the
        // caller.
        let client = self.clone();
        self.offload.spawn(async move {
            match client.perform(&options).await {
                Ok(real) if real.success => {
                    if let Err(error) = client.write_back(&options, &real).await {
                        warn!(%error, path = %options.path, "background dispatch could not persist its result");
                    }
                }
                Ok(real) => {
                    warn!(
                        path = %options.path,
                        success = real.success,
                        "background dispatch completed without success; keeping the synthesized envelope"
                    );
                }
                Err(error) => {
                    warn!(%error, path = %options.path, "background dispatch failed");
                }
            }
        });

        Ok(envelope)
    }

    async fn orchestrate(&self, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        let options = match &self.defaults {
            Some(defaults) => options.merged_over(defaults),
            None => options,
        };
        // Chains are fixed from the descriptor as submitted; request
        // interceptors cannot inject further interceptors.
        let chains = self.merged_chains(&options.interceptors);
        let options = chain_request_interceptors(options, &chains.request).await;

        if options.cache.is_some() && self.store.is_none() {
            return Err(ConfigError::CacheStoreNotConfigured.into());
        }

        if let (Some(directive), Some(store)) = (&options.cache, &self.store) {
            if directive.force {
                debug!(key = %directive.key, "cache read bypassed by force directive");
            } else if let Some(mut envelope) =
                store.get::<ResponseEnvelope>(&directive.key).await?
            {
                debug!(key = %directive.key, "cache hit");
                envelope.cached = true;
                if chains.execute_on_cached {
                    envelope = chain_response_interceptors(envelope, &chains.response).await;
                }
                return Ok(envelope);
            } else {
                debug!(key = %directive.key, "cache miss");
            }
        }

        if let Some(lifecycle) = options.lifecycle.clone()
            && let OverrideDecision::ForceReturn(data) = lifecycle.on_request_init(&options).await
        {
            return self.force_return(options, data, &chains).await;
        }

        let envelope = self.perform(&options).await?;
        self.write_back(&options, &envelope).await?;
        Ok(chain_response_interceptors(envelope, &chains.response).await)
    }
}

fn assemble(response: &TransportResponse, options: &RequestOptions) -> ResponseEnvelope {
    // A body that fails to parse degrades to null; success tracks the
    // transport status, not the parse.
    let data = response.json().unwrap_or(Value::Null);
    ResponseEnvelope::new(response.ok(), data, false, options.clone())
}

#[async_trait]
impl Fetcher for Client {
    async fn request(&self, options: RequestOptions) -> Result<ResponseEnvelope, Error> {
        self.orchestrate(options).await
    }

    async fn invalidate(&self, key: &CacheKey) -> Result<bool, Error> {
        let Some(store) = &self.store else {
            return Err(ConfigError::CacheStoreNotConfigured.into());
        };
        Ok(store.delete(key).await?)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("origin", &self.origin)
            .field("store", &self.store.as_ref().map(|store| store.name()))
            .field("interceptors", &self.interceptors)
            .field("defaults", &self.defaults)
            .finish()
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    origin: String,
    store: Option<Arc<dyn Backend>>,
    transport: Option<Arc<dyn Transport>>,
    interceptors: InterceptorConfig,
    defaults: Option<RequestOptions>,
}

impl ClientBuilder {
    /// Sets the cache store.
    pub fn cache(mut self, backend: impl Backend + 'static) -> Self {
        self.store = Some(Arc::new(backend));
        self
    }

    /// Sets a cache store shared with other clients.
    pub fn shared_cache(mut self, backend: Arc<dyn Backend>) -> Self {
        self.store = Some(backend);
        self
    }

    /// Replaces the default reqwest transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Sets the instance interceptor configuration. Instance-level
    /// interceptors run before per-call ones.
    pub fn interceptors(mut self, interceptors: InterceptorConfig) -> Self {
        self.interceptors = interceptors;
        self
    }

    /// Appends an instance-level request interceptor.
    pub fn request_interceptor(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.interceptors.request.push(Arc::new(interceptor));
        self
    }

    /// Appends an instance-level response interceptor.
    pub fn response_interceptor(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.interceptors.response.push(Arc::new(interceptor));
        self
    }

    /// Runs the response chain over cache hits too.
    pub fn execute_on_cached(mut self) -> Self {
        self.interceptors.execute_on_cached = true;
        self
    }

    /// Sets instance-level default request options, merged under every
    /// call with per-call values taking precedence.
    pub fn default_options(mut self, defaults: RequestOptions) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Client {
        Client {
            origin: self.origin,
            store: self.store,
            transport: self
                .transport
                .unwrap_or_else(|| Arc::new(ReqwestTransport::new())),
            interceptors: self.interceptors,
            defaults: self.defaults,
            offload: OffloadManager::new(),
        }
    }
}
