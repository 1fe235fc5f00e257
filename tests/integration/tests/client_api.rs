//! Facade-level scenarios: endpoint groups through the mock API

use cord_client::{Client, CreateMessage};
use cord_common::{ClientConfig, Snowflake};
use cord_integration_tests::helpers::{MockApi, MockResponse};
use serde_json::json;

async fn client_against(server: &MockApi) -> Client {
    let config = ClientConfig::new("facade-token").with_api_base(server.base_url());
    Client::from_config(config).unwrap()
}

#[tokio::test]
async fn test_gateway_bot_info() {
    let server = MockApi::start().await.unwrap();
    server.enqueue(
        "/gateway/bot",
        MockResponse::ok(json!({
            "url": "wss://gateway.example",
            "shards": 3,
            "session_start_limit": {
                "total": 1000, "remaining": 997,
                "reset_after": 14_400_000, "max_concurrency": 1
            }
        })),
    );

    let client = client_against(&server).await;
    let info = client.gateway().get_bot().await.unwrap();

    assert_eq!(info.url, "wss://gateway.example");
    assert_eq!(info.shards, 3);
    assert_eq!(info.session_start_limit.remaining, 997);
}

#[tokio::test]
async fn test_create_message_and_fetch_back() {
    let server = MockApi::start().await.unwrap();
    server.enqueue(
        "/channels/42/messages",
        MockResponse::ok(json!({"id": "100", "content": "hello"})),
    );

    let client = client_against(&server).await;
    let message = client
        .channels()
        .create_message(Snowflake::new(42), CreateMessage::new().content("hello"))
        .await
        .unwrap();

    assert_eq!(message["id"], "100");
    assert_eq!(server.hits_for("/channels/42/messages").len(), 1);
}

#[tokio::test]
async fn test_delete_message_sends_audit_reason() {
    let server = MockApi::start().await.unwrap();
    server.enqueue("/channels/42/messages/100", MockResponse::no_content());

    let client = client_against(&server).await;
    client
        .channels()
        .delete_message(Snowflake::new(42), Snowflake::new(100), Some("spam"))
        .await
        .unwrap();

    let hits = server.hits_for("/channels/42/messages/100");
    assert_eq!(hits[0].audit_reason.as_deref(), Some("spam"));
    assert_eq!(hits[0].authorization.as_deref(), Some("Bot facade-token"));
}

#[tokio::test]
async fn test_widget_image_returns_raw_bytes() {
    let server = MockApi::start().await.unwrap();
    server.enqueue("/guilds/9/widget.png", MockResponse::ok(json!({"png": true})));

    let client = client_against(&server).await;
    let bytes = client.guilds().widget_image(Snowflake::new(9)).await.unwrap();

    // raw mode hands the body back undecoded
    assert_eq!(&bytes[..], br#"{"png":true}"#);
}

#[tokio::test]
async fn test_cache_memoizes_fetches() {
    let server = MockApi::start().await.unwrap();
    server.enqueue("/users/7", MockResponse::ok(json!({"id": "7", "username": "quill"})));

    let client = client_against(&server).await;

    for _ in 0..3 {
        let users = client.cache().users();
        let fetched = users
            .get_or_compute("7", || async {
                client.users().get(Snowflake::new(7)).await.unwrap()
            })
            .await;
        assert_eq!(fetched["username"], "quill");
    }

    // only the first pass touched the API
    assert_eq!(server.hits_for("/users/7").len(), 1);
}
