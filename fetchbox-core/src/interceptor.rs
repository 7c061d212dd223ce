//! Interceptor traits and chain application.
//!
//! Two independent chains exist: request interceptors run before dispatch,
//! response interceptors run after the final envelope is built (and over
//! cache hits when `execute_on_cached` is enabled). Each interceptor is a
//! pure transform over the full value, applied exactly once per request,
//! left to right, each one seeing the accumulated output of all prior
//! ones. An empty chain is the identity transform.
//!
//! Plain closures lift into interceptors automatically:
//!
//! ```
//! use fetchbox_core::{chain_request_interceptors, RequestInterceptor, RequestOptions};
//! use http::Method;
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let upcase: Arc<dyn RequestInterceptor> = Arc::new(|mut options: RequestOptions| {
//!     options.path = options.path.to_uppercase();
//!     options
//! });
//! let options = RequestOptions::new(Method::GET, "/hello");
//! let options = chain_request_interceptors(options, &[upcase]).await;
//! assert_eq!(options.path, "/HELLO");
//! # });
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use crate::request::RequestOptions;
use crate::response::ResponseEnvelope;

/// Transform applied to a request descriptor before dispatch.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    /// Transforms the descriptor.
    async fn intercept(&self, options: RequestOptions) -> RequestOptions;
}

/// Transform applied to a response envelope after assembly.
#[async_trait]
pub trait ResponseInterceptor: Send + Sync {
    /// Transforms the envelope.
    async fn intercept(&self, response: ResponseEnvelope) -> ResponseEnvelope;
}

#[async_trait]
impl<F> RequestInterceptor for F
where
    F: Fn(RequestOptions) -> RequestOptions + Send + Sync,
{
    async fn intercept(&self, options: RequestOptions) -> RequestOptions {
        self(options)
    }
}

#[async_trait]
impl<F> ResponseInterceptor for F
where
    F: Fn(ResponseEnvelope) -> ResponseEnvelope + Send + Sync,
{
    async fn intercept(&self, response: ResponseEnvelope) -> ResponseEnvelope {
        self(response)
    }
}

/// Interceptor configuration, attachable at the instance or call level.
#[derive(Clone, Default)]
pub struct InterceptorConfig {
    /// Request interceptor chain.
    pub request: Vec<Arc<dyn RequestInterceptor>>,
    /// Response interceptor chain.
    pub response: Vec<Arc<dyn ResponseInterceptor>>,
    /// Run the response chain over cache hits too.
    pub execute_on_cached: bool,
}

impl InterceptorConfig {
    /// Appends a request interceptor.
    pub fn request(mut self, interceptor: impl RequestInterceptor + 'static) -> Self {
        self.request.push(Arc::new(interceptor));
        self
    }

    /// Appends a response interceptor.
    pub fn response(mut self, interceptor: impl ResponseInterceptor + 'static) -> Self {
        self.response.push(Arc::new(interceptor));
        self
    }

    /// Enables running the response chain over cache hits.
    pub fn execute_on_cached(mut self) -> Self {
        self.execute_on_cached = true;
        self
    }
}

impl std::fmt::Debug for InterceptorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterceptorConfig")
            .field("request", &self.request.len())
            .field("response", &self.response.len())
            .field("execute_on_cached", &self.execute_on_cached)
            .finish()
    }
}

/// Applies a request interceptor chain left to right.
pub async fn chain_request_interceptors(
    options: RequestOptions,
    interceptors: &[Arc<dyn RequestInterceptor>],
) -> RequestOptions {
    let mut options = options;
    for interceptor in interceptors {
        options = interceptor.intercept(options).await;
    }
    options
}

/// Applies a response interceptor chain left to right.
pub async fn chain_response_interceptors(
    response: ResponseEnvelope,
    interceptors: &[Arc<dyn ResponseInterceptor>],
) -> ResponseEnvelope {
    let mut response = response;
    for interceptor in interceptors {
        response = interceptor.intercept(response).await;
    }
    response
}
