//! REST rate-limiting scenarios against the mock API
//!
//! These drive the real dispatcher + middleware + reqwest stack end to end
//! and assert the coordination the bucket table promises.

use cord_integration_tests::helpers::{MockApi, MockResponse};
use cord_rest::{Method, RequestOptions, Rest, RestError, Route};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn get(path: &str) -> Route {
    Route::new(Method::GET, path)
}

async fn server_and_rest() -> (MockApi, Arc<Rest>) {
    let server = MockApi::start().await.unwrap();
    let rest = Arc::new(Rest::with_base("test-token", &server.base_url()).unwrap());
    (server, rest)
}

#[tokio::test]
async fn test_same_key_requests_serialize() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/locked",
        MockResponse::ok(json!({"n": 1})).with_delay(Duration::from_millis(400)),
    );
    server.enqueue("/locked", MockResponse::ok(json!({"n": 2})));

    let first = {
        let rest = rest.clone();
        tokio::spawn(async move { rest.request(get("/locked"), RequestOptions::new()).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second = {
        let rest = rest.clone();
        tokio::spawn(async move { rest.request(get("/locked"), RequestOptions::new()).await })
    };

    // within 100 ms the second request must still be queued behind the first
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!second.is_finished());

    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();

    let hits = server.hits_for("/locked");
    assert_eq!(hits.len(), 2);
    // the second never entered the transport while the first was in flight
    assert!(hits[1].started >= hits[0].finished);
}

#[tokio::test]
async fn test_exhausted_bucket_blocks_next_request() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/empty",
        MockResponse::ok(json!({})).with_rate_limit(1, 0, 10_000.0, "bucket-empty"),
    );

    rest.request(get("/empty"), RequestOptions::new()).await.unwrap();

    let blocked = {
        let rest = rest.clone();
        tokio::spawn(async move { rest.request(get("/empty"), RequestOptions::new()).await })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!blocked.is_finished());
    blocked.abort();
}

#[tokio::test]
async fn test_global_lockout_blocks_every_key() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/surge",
        MockResponse::status(429, json!({"message": "globally limited"}))
            .with_header("retry-after", "50000.0")
            .with_header("x-ratelimit-global", "true"),
    );

    let trigger = {
        let rest = rest.clone();
        tokio::spawn(async move { rest.request(get("/surge"), RequestOptions::new()).await })
    };

    // let the 429 land and the global holder start
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(server.hits_for("/surge").len(), 1);

    let unrelated = {
        let rest = rest.clone();
        tokio::spawn(async move { rest.request(get("/unrelated"), RequestOptions::new()).await })
    };

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!unrelated.is_finished());

    trigger.abort();
    unrelated.abort();
}

#[tokio::test]
async fn test_bucket_reset_unblocks() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/fast",
        MockResponse::ok(json!({})).with_rate_limit(1, 0, 0.1, "bucket-fast"),
    );

    rest.request(get("/fast"), RequestOptions::new()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;

    // the window has reset; no residual delay is allowed
    let started = Instant::now();
    rest.request(get("/fast"), RequestOptions::new()).await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn test_429_retried_until_success() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/busy",
        MockResponse::status(429, json!({"message": "slow down"}))
            .with_header("retry-after", "100.0"),
    );
    server.enqueue("/busy", MockResponse::ok(json!({"ok": true})));

    let started = Instant::now();
    let body = rest.request(get("/busy"), RequestOptions::new()).await.unwrap();

    assert_eq!(body.unwrap()["ok"], true);
    // 100 ms retry-after means the second attempt waited out the window
    assert!(started.elapsed() >= Duration::from_millis(80));
    assert_eq!(server.hits_for("/busy").len(), 2);
}

#[tokio::test]
async fn test_client_error_carries_body_and_trace() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/missing",
        MockResponse::status(404, json!({"code": 10003, "message": "Unknown Channel"})),
    );

    let err = rest
        .request(get("/missing"), RequestOptions::new())
        .await
        .unwrap_err();

    match err {
        RestError::NotFound { error, trace } => {
            assert_eq!(error.code, 10003);
            assert_eq!(error.message, "Unknown Channel");
            assert_eq!(trace.len(), 6);
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_content_and_not_modified() {
    let (server, rest) = server_and_rest().await;
    server.enqueue("/gone", MockResponse::no_content());
    server.enqueue("/gone", MockResponse::status(304, serde_json::Value::Null));

    for _ in 0..2 {
        let body = rest.request(get("/gone"), RequestOptions::new()).await.unwrap();
        assert!(body.is_none());
    }
}

#[tokio::test]
async fn test_auth_prefix_and_audit_reason_headers() {
    let (server, rest) = server_and_rest().await;
    server.enqueue("/moderate", MockResponse::ok(json!({})));

    rest.request(
        get("/moderate"),
        RequestOptions::new().reason("spam cleanup"),
    )
    .await
    .unwrap();

    let hits = server.hits_for("/moderate");
    assert_eq!(hits[0].authorization.as_deref(), Some("Bot test-token"));
    assert_eq!(hits[0].audit_reason.as_deref(), Some("spam cleanup"));
}

#[tokio::test]
async fn test_distinct_major_params_do_not_serialize() {
    let (server, rest) = server_and_rest().await;
    server.enqueue(
        "/channels/1/messages",
        MockResponse::ok(json!([])).with_delay(Duration::from_millis(300)),
    );
    server.enqueue("/channels/2/messages", MockResponse::ok(json!([])));

    let slow = {
        let rest = rest.clone();
        tokio::spawn(async move {
            rest.request(
                Route::new(Method::GET, "/channels/%{channel_id}/messages")
                    .param("channel_id", 1u64),
                RequestOptions::new(),
            )
            .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // a different channel id is a different bucket key: no queueing
    let started = Instant::now();
    rest.request(
        Route::new(Method::GET, "/channels/%{channel_id}/messages").param("channel_id", 2u64),
        RequestOptions::new(),
    )
    .await
    .unwrap();
    assert!(started.elapsed() < Duration::from_millis(200));

    slow.await.unwrap().unwrap();
}
