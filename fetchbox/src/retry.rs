//! Bounded fixed-delay retry driver.

use fetchbox_core::{RetryDirective, Transport, TransportRequest, TransportResponse};
use tracing::debug;

use crate::error::{ConfigError, Error};

/// Final outcome of a dispatch-with-retry cycle.
#[derive(Debug)]
pub(crate) enum Dispatched {
    /// A response was obtained: the first success, or a non-success
    /// response that had no retry budget left to spend on it.
    Completed(TransportResponse),
    /// Every dispatch in the budget reported a non-success status.
    Exhausted {
        attempts: u32,
        last: TransportResponse,
    },
}

/// Dispatches `request`, resending on non-success status when a retry
/// directive is present.
///
/// `attempts` is the total dispatch budget including the initial send;
/// each resend waits the directive's fixed delay first. The delay is a
/// suspending wait — concurrent requests keep running. A zero delay is a
/// configuration error and fails before any resend. Errors below the HTTP
/// layer propagate immediately; they are not part of the resend loop.
pub(crate) async fn dispatch_with_retry(
    transport: &dyn Transport,
    request: &TransportRequest,
    retry: Option<&RetryDirective>,
) -> Result<Dispatched, Error> {
    let mut response = transport
        .dispatch(request.clone())
        .await
        .map_err(Error::Transport)?;
    if response.ok() {
        return Ok(Dispatched::Completed(response));
    }

    // A non-success response without retry directives is a valid terminal
    // outcome, not an error.
    let Some(retry) = retry else {
        return Ok(Dispatched::Completed(response));
    };
    if retry.delay.is_zero() {
        return Err(ConfigError::InvalidRetryDelay.into());
    }

    let mut sent = 1u32;
    while sent < retry.attempts {
        tokio::time::sleep(retry.delay).await;
        sent += 1;
        debug!(
            attempt = sent,
            attempts = retry.attempts,
            url = %request.url,
            "resending failed request"
        );
        response = transport
            .dispatch(request.clone())
            .await
            .map_err(Error::Transport)?;
        if response.ok() {
            return Ok(Dispatched::Completed(response));
        }
    }

    Ok(Dispatched::Exhausted {
        attempts: retry.attempts,
        last: response,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use fetchbox_core::TransportError;
    use http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Transport that fails with 500 for the first `failures` dispatches,
    /// then succeeds.
    struct FlakyTransport {
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyTransport {
        fn new(failures: usize) -> Self {
            FlakyTransport {
                failures,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Transport for FlakyTransport {
        async fn dispatch(
            &self,
            _request: TransportRequest,
        ) -> Result<TransportResponse, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let status = if call < self.failures {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::OK
            };
            Ok(TransportResponse::new(status, Bytes::from_static(b"{}")))
        }
    }

    fn request() -> TransportRequest {
        TransportRequest {
            url: "http://localhost/endpoint".into(),
            method: Method::GET,
            headers: Default::default(),
            body: None,
        }
    }

    fn directive(attempts: u32, delay_ms: u64) -> RetryDirective {
        RetryDirective::new(attempts, Duration::from_millis(delay_ms))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_within_budget() {
        let transport = FlakyTransport::new(2);
        let outcome =
            dispatch_with_retry(&transport, &request(), Some(&directive(3, 200)))
                .await
                .unwrap();

        assert_eq!(transport.calls(), 3);
        match outcome {
            Dispatched::Completed(response) => assert!(response.ok()),
            Dispatched::Exhausted { .. } => panic!("expected completion"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_exactly_the_budget() {
        let transport = FlakyTransport::new(usize::MAX);
        let outcome =
            dispatch_with_retry(&transport, &request(), Some(&directive(3, 200)))
                .await
                .unwrap();

        assert_eq!(transport.calls(), 3);
        match outcome {
            Dispatched::Exhausted { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(!last.ok());
            }
            Dispatched::Completed(_) => panic!("expected exhaustion"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn zero_delay_fails_without_resending() {
        let transport = FlakyTransport::new(usize::MAX);
        let error = dispatch_with_retry(&transport, &request(), Some(&directive(3, 0)))
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), 1);
        assert!(matches!(
            error,
            Error::Config(ConfigError::InvalidRetryDelay)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn success_skips_the_retry_loop() {
        let transport = FlakyTransport::new(0);
        let outcome =
            dispatch_with_retry(&transport, &request(), Some(&directive(3, 200)))
                .await
                .unwrap();

        assert_eq!(transport.calls(), 1);
        assert!(matches!(outcome, Dispatched::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn non_success_without_directive_is_terminal() {
        let transport = FlakyTransport::new(usize::MAX);
        let outcome = dispatch_with_retry(&transport, &request(), None)
            .await
            .unwrap();

        assert_eq!(transport.calls(), 1);
        match outcome {
            Dispatched::Completed(response) => assert!(!response.ok()),
            Dispatched::Exhausted { .. } => panic!("no directive, no exhaustion"),
        }
    }
}
