//! Connection-level retries through a session, on paused time.

mod common;

use common::*;
use serde_json::json;
use std::time::Duration;
use tokio::time::Instant;

use sessionlink::error::{ErrorCategory, NetworkError};
use sessionlink::traits::HttpError;
use sessionlink::SessionError;

#[tokio::test(start_paused = true)]
async fn test_connection_failures_are_retried_with_linear_backoff() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend
        .http
        .push_error(&url("/items"), HttpError::ConnectionFailed("refused".to_string()));
    backend
        .http
        .push_error(&url("/items"), HttpError::ConnectionFailed("refused".to_string()));
    backend.http.set_response(&url("/items"), ok(json!([1])));

    let start = Instant::now();
    assert_eq!(tab.get("/items").await.unwrap(), json!([1]));

    // 100ms then 200ms
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(300) && elapsed < Duration::from_millis(310));
    assert_eq!(backend.http.request_count(&url("/items")), 3);
}

#[tokio::test(start_paused = true)]
async fn test_gives_up_after_three_retries() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    for _ in 0..5 {
        backend
            .http
            .push_error(&url("/items"), HttpError::ConnectionFailed("refused".to_string()));
    }

    let err = tab.get("/items").await.unwrap_err();

    assert_eq!(backend.http.request_count(&url("/items")), 4);
    assert_eq!(err.category(), ErrorCategory::Network);
    assert!(err.is_retryable());
    assert_eq!(err.context().unwrap().retry_count, 3);
    assert!(matches!(
        err.inner(),
        SessionError::Network(NetworkError::ConnectionFailed { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_slow_server_times_out_each_attempt() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend
        .builder(config().with_max_retries(1))
        .build()
        .await
        .unwrap();
    backend.http.set_response(&url("/dashboard"), ok(json!({})));
    backend.http.set_latency(Duration::from_secs(600));

    let start = Instant::now();
    let err = tab.get("/dashboard").await.unwrap_err();

    // Two 45s attempts and a 100ms pause between them.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(90_100) && elapsed < Duration::from_millis(90_200));
    assert!(matches!(
        err.inner(),
        SessionError::Network(NetworkError::Timeout { duration_secs: 45, .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_refresh_replay_does_not_consume_retries() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend
        .http
        .push_error(&url("/items"), HttpError::ConnectionFailed("refused".to_string()));
    backend.http.push_response(&url("/items"), unauthorized());
    backend
        .http
        .push_error(&url("/items"), HttpError::Timeout("slow".to_string()));
    backend.http.set_response(&url("/items"), ok(json!("done")));

    assert_eq!(tab.get("/items").await.unwrap(), json!("done"));
    assert_eq!(backend.http.request_count(&url("/items")), 4);
    assert_eq!(backend.refresher.call_count(), 1);
}
