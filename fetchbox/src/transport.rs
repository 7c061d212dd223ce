//! Default transport over reqwest.

use async_trait::async_trait;
use fetchbox_core::{Transport, TransportError, TransportRequest, TransportResponse};

/// [`Transport`] implementation backed by a shared [`reqwest::Client`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a fresh client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over an existing client, keeping its pools and
    /// settings.
    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn dispatch(
        &self,
        request: TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok(TransportResponse::new(status, body))
    }
}
