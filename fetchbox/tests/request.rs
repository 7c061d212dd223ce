//! End-to-end tests for plain and retried requests.

use std::time::Duration;

use fetchbox::{Client, ConfigError, Error, Fetcher, RequestOptions, RetryDirective};
use fetchbox_core::CacheDirective;
use serde_json::json;
use wiremock::matchers::{any, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn retry(attempts: u32, delay_ms: u64) -> RetryDirective {
    RetryDirective::new(attempts, Duration::from_millis(delay_ms))
}

#[tokio::test]
async fn base_request_without_caching() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Success"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let envelope = client.get("/hello", RequestOptions::default()).await.unwrap();

    assert!(envelope.success);
    assert!(!envelope.cached);
    assert_eq!(envelope.data, json!({"message": "Success"}));
    assert_eq!(envelope.options.path, "/hello");
}

#[tokio::test]
async fn instance_default_options_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = http::HeaderMap::new();
    headers.insert(
        http::header::AUTHORIZATION,
        "Bearer token".parse().unwrap(),
    );
    let client = Client::builder(server.uri())
        .default_options(RequestOptions::default().headers(headers))
        .build();

    let envelope = client.get("/hello", RequestOptions::default()).await.unwrap();
    assert!(envelope.success);
}

#[tokio::test]
async fn post_sends_a_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(wiremock::matchers::body_json(json!({"hello": "world"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let envelope = client
        .post("/submit", RequestOptions::default().body(json!({"hello": "world"})))
        .await
        .unwrap();
    assert!(envelope.success);
}

#[tokio::test]
async fn retry_recovers_within_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/endpoint"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/endpoint"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Success"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let envelope = client
        .get("/endpoint", RequestOptions::default().retry(retry(3, 50)))
        .await
        .unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.data, json!({"message": "Success"}));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn retry_exhaustion_carries_the_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/endpoint"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "down"})))
        .expect(3)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let error = client
        .get("/endpoint", RequestOptions::default().retry(retry(3, 50)))
        .await
        .unwrap_err();

    match error {
        Error::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(!last.success);
            assert_eq!(last.data, json!({"error": "down"}));
        }
        other => panic!("expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn zero_retry_delay_is_a_configuration_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/endpoint"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let error = client
        .get("/endpoint", RequestOptions::default().retry(retry(3, 0)))
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Config(ConfigError::InvalidRetryDelay)
    ));
    // The initial dispatch happened; no resend did.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn non_success_without_retry_is_a_terminal_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "not found"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let envelope = client.get("/missing", RequestOptions::default()).await.unwrap();

    assert!(!envelope.success);
    assert_eq!(envelope.data, json!({"error": "not found"}));
}

#[tokio::test]
async fn unparsable_body_degrades_to_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let client = Client::new(server.uri());
    let envelope = client.get("/html", RequestOptions::default()).await.unwrap();

    assert!(envelope.success);
    assert_eq!(envelope.data, serde_json::Value::Null);
}

#[tokio::test]
async fn cache_directive_without_a_store_fails_before_dispatch() {
    let server = MockServer::start().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(200)).mount(&server).await;

    let client = Client::new(server.uri());
    let error = client
        .get(
            "/hello",
            RequestOptions::default().cache(CacheDirective::new("hello")),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Config(ConfigError::CacheStoreNotConfigured)
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}
