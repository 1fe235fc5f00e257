//! Gateway handshake over a real WebSocket
//!
//! Exercises the tokio-tungstenite transport against an in-process ws
//! server that speaks the HELLO/IDENTIFY/READY script.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use cord_gateway::{Shard, ShardConfig};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::timeout;

async fn upgrade(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(speak_gateway)
}

/// Minimal server side of the protocol: hello, ack heartbeats, answer the
/// identify with READY
async fn speak_gateway(mut socket: WebSocket) {
    let hello = json!({"op": 10, "d": {"heartbeat_interval": 45000}});
    if socket.send(Message::Text(hello.to_string())).await.is_err() {
        return;
    }

    while let Some(Ok(message)) = socket.recv().await {
        let Message::Text(text) = message else { continue };
        let Ok(frame) = serde_json::from_str::<Value>(&text) else { continue };

        match frame["op"].as_u64() {
            Some(1) => {
                let ack = json!({"op": 11});
                if socket.send(Message::Text(ack.to_string())).await.is_err() {
                    return;
                }
            }
            Some(2) => {
                assert_eq!(frame["d"]["token"], "ws-token");
                let ready = json!({
                    "op": 0, "t": "READY", "s": 1,
                    "d": {"session_id": "ws-e2e"}
                });
                if socket.send(Message::Text(ready.to_string())).await.is_err() {
                    return;
                }
            }
            _ => {}
        }
    }
}

async fn start_gateway_server() -> SocketAddr {
    let app = Router::new().route("/gateway", get(upgrade));
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

#[tokio::test]
async fn test_handshake_over_real_websocket() {
    let addr = start_gateway_server().await;

    let shard = Shard::new(
        &format!("ws://{addr}/gateway"),
        ShardConfig::new("ws-token").reconnect_delay(Duration::from_millis(50)),
    )
    .unwrap();
    let run = shard.start();

    // wait until READY latched the session
    let deadline = tokio::time::Instant::now() + Duration::from_secs(3);
    loop {
        if shard.session().id().as_deref() == Some("ws-e2e") {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "gateway never reached READY"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(shard.session().seq(), Some(1));

    shard.close(1000, "test done", false).await.unwrap();
    let result = timeout(Duration::from_secs(2), run).await.unwrap().unwrap();
    assert!(result.is_ok());
}
