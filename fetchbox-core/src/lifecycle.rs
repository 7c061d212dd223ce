//! Request-lifecycle override hook.

use async_trait::async_trait;
use serde_json::Value;

use crate::request::RequestOptions;

/// Decision returned by [`Lifecycle::on_request_init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideDecision {
    /// Proceed with normal dispatch.
    Continue,
    /// Short-circuit: return a synthesized successful, uncached envelope
    /// built from this value, while the real dispatch continues as a
    /// detached background task.
    ForceReturn(Value),
}

/// Caller-supplied hook invoked after the cache check and before dispatch.
///
/// The hook can short-circuit normal flow with an optimistic or
/// locally-computed result; the orchestrator still fires the real request
/// in the background, and its success determines what ultimately stays
/// persisted under the cache key. A hook that needs cache access captures
/// its own handle to the store:
///
/// ```
/// use async_trait::async_trait;
/// use fetchbox_core::{Lifecycle, OverrideDecision, RequestOptions};
/// use serde_json::{json, Value};
///
/// struct Optimistic;
///
/// #[async_trait]
/// impl Lifecycle for Optimistic {
///     async fn on_request_init(&self, options: &RequestOptions) -> OverrideDecision {
///         match &options.body {
///             Some(body) => OverrideDecision::ForceReturn(body.clone()),
///             None => OverrideDecision::Continue,
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Inspects the merged, intercepted descriptor and decides whether to
    /// override normal dispatch.
    async fn on_request_init(&self, options: &RequestOptions) -> OverrideDecision;
}
