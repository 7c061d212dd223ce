//! Response envelope type.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::request::RequestOptions;

/// The assembled result of one orchestrated request.
///
/// `success` mirrors the transport status (2xx), not whether the body
/// parsed. `data` is the parsed JSON body, degraded to `Value::Null` when
/// the body failed to parse. `cached` reflects whether *this particular
/// return* was served from the cache store, not whether the underlying
/// entry was ever cached before.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Whether the transport reported a successful status.
    pub success: bool,
    /// Parsed JSON body, `Value::Null` on parse failure.
    pub data: Value,
    /// Whether this return was served from the cache store.
    pub cached: bool,
    /// The descriptor the envelope was assembled for.
    pub options: RequestOptions,
}

impl ResponseEnvelope {
    /// Creates an envelope.
    pub fn new(success: bool, data: Value, cached: bool, options: RequestOptions) -> Self {
        ResponseEnvelope {
            success,
            data,
            cached,
            options,
        }
    }

    /// Typed view of `data`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.data.clone())
    }
}
