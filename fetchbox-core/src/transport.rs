//! Transport seam.
//!
//! The orchestrator depends only on this shape: send an HTTP request, get
//! back a status and a body. Any conforming client satisfies it; the
//! default implementation over reqwest lives in the `fetchbox` crate, and
//! tests substitute their own.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use serde_json::Value;

/// Error type transports report. Opaque to the orchestrator.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// A fully resolved request as handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Absolute request URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers.
    pub headers: HeaderMap,
    /// Serialized request body, absent for GET.
    pub body: Option<Bytes>,
}

/// Status and body of a dispatched request.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    status: StatusCode,
    body: Bytes,
}

impl TransportResponse {
    /// Creates a response from its parts.
    pub fn new(status: StatusCode, body: Bytes) -> Self {
        TransportResponse { status, body }
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The raw response body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// The network primitive the orchestrator dispatches through.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and resolves with its status and body.
    ///
    /// A non-success status is a *completed* response, not an error;
    /// errors are reserved for failures below the HTTP layer.
    async fn dispatch(&self, request: TransportRequest)
    -> Result<TransportResponse, TransportError>;
}
