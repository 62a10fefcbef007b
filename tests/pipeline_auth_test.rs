//! Outbound decoration and inbound classification through a session.

mod common;

use common::*;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use sessionlink::adapters::CookieJar;
use sessionlink::error::{AuthError, ErrorCategory};
use sessionlink::traits::Response;
use sessionlink::{Method, RequestOptions, SessionError};

#[tokio::test]
async fn test_mutations_carry_csrf_header() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend
        .builder(config())
        .with_cookies(Arc::new(CookieJar::parse("session=abc; csrf_token=t%2Bk")))
        .build()
        .await
        .unwrap();
    backend.http.set_response(&url("/items"), ok(json!({})));

    tab.get("/items").await.unwrap();
    tab.post("/items", &json!({"name": "a"})).await.unwrap();
    tab.delete("/items").await.unwrap();

    let sent = backend.http.requests_to(&url("/items"));
    assert_eq!(sent[0].headers.get("X-CSRF-Token"), None);
    assert_eq!(
        sent[1].headers.get("X-CSRF-Token").map(String::as_str),
        Some("t+k")
    );
    assert_eq!(sent[1].body.as_deref(), Some(r#"{"name":"a"}"#));
    assert_eq!(
        sent[1].headers.get("Content-Type").map(String::as_str),
        Some("application/json")
    );
    assert_eq!(
        sent[2].headers.get("X-CSRF-Token").map(String::as_str),
        Some("t+k")
    );
}

#[tokio::test]
async fn test_login_endpoint_rejection_is_not_refreshed() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend.http.set_response(
        &url("/auth/login"),
        Response::json_body(
            401,
            &json!({"success": false, "message": "Wrong password", "error": {"code": "BAD_CREDENTIALS"}}),
        ),
    );

    let err = tab
        .post("/auth/login", &json!({"user": "u", "password": "p"}))
        .await
        .unwrap_err();

    match err.inner() {
        SessionError::Auth(AuthError::Rejected { status, message, code, .. }) => {
            assert_eq!(*status, 401);
            assert_eq!(message, "Wrong password");
            assert_eq!(code.as_deref(), Some("BAD_CREDENTIALS"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(backend.refresher.call_count(), 0);
    assert_eq!(backend.http.request_count(&url("/auth/login")), 1);

    let sent = backend.http.requests_to(&url("/auth/login"));
    assert_eq!(sent[0].headers.get("Authorization"), None);
}

#[tokio::test]
async fn test_per_path_timeouts() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend.http.set_default_response(sessionlink::adapters::mock::MockResponse::Success(ok(
        json!(null),
    )));

    tab.get("/projects/7/scan").await.unwrap();
    tab.get("/dashboard/summary").await.unwrap();
    tab.get("/items").await.unwrap();
    tab.request(
        Method::Get,
        "/projects/7/scan",
        None,
        &RequestOptions::new().with_timeout(Duration::from_secs(5)),
    )
    .await
    .unwrap();

    let timeouts: Vec<Duration> = backend.http.requests().iter().map(|r| r.timeout).collect();
    assert_eq!(
        timeouts,
        vec![
            Duration::from_secs(120),
            Duration::from_secs(45),
            Duration::from_secs(30),
            Duration::from_secs(5),
        ]
    );
}

#[tokio::test]
async fn test_business_failure_is_surfaced() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend.http.set_response(
        &url("/items"),
        Response::json_body(
            200,
            &json!({
                "success": false,
                "message": "Name already taken",
                "error": {"code": "DUPLICATE", "recovery_suggestion": "Pick another name"}
            }),
        ),
    );

    let err = tab.post("/items", &json!({"name": "a"})).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Business);
    assert_eq!(err.user_message(), "Name already taken");
    assert_eq!(err.recovery_hint(), "Pick another name");
    assert!(!err.requires_reauth());
    let context = err.context().unwrap();
    assert_eq!(context.method.as_deref(), Some("POST"));
    assert_eq!(context.url.as_deref(), Some(url("/items").as_str()));
}

#[tokio::test]
async fn test_plain_error_status_is_system_error() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend.http.set_response(
        &url("/items"),
        Response::new(503, bytes::Bytes::from("upstream unavailable")),
    );

    let err = tab.get("/items").await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::Server);
    assert_eq!(backend.http.request_count(&url("/items")), 1);
}

#[tokio::test]
async fn test_custom_headers_do_not_override_bearer() {
    let backend = Backend::signed_in(test_credential());
    let tab = backend.tab().await;
    backend.http.set_response(&url("/items"), ok(json!([])));

    tab.request(
        Method::Get,
        "/items",
        None,
        &RequestOptions::new()
            .with_header("X-Trace", "t-1")
            .with_header("Authorization", "Bearer forged"),
    )
    .await
    .unwrap();

    let sent = backend.http.requests_to(&url("/items")).pop().unwrap();
    assert_eq!(sent.headers.get("X-Trace").map(String::as_str), Some("t-1"));
    assert_eq!(
        sent.headers.get("Authorization").map(String::as_str),
        Some("Bearer test-access-token")
    );
}
