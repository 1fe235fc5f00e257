//! tokio-tungstenite connector
//!
//! Dials TCP/TLS (TLS for `wss`), performs the WebSocket handshake, and
//! runs a pump task that multiplexes outbound frames and socket reads into
//! the engine's event channel. Benign I/O faults terminate the pump with a
//! codeless `Close`; the engine decides whether to reconnect.

use super::{Connector, OutboundFrame, TransportEvent, TransportHandle};
use crate::error::GatewayError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use url::Url;

/// Channel depth for both directions of one connection
const FRAME_BUFFER: usize = 64;

/// The production WebSocket connector
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Create a connector
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(
        &self,
        url: &Url,
    ) -> Result<(TransportHandle, mpsc::Receiver<TransportEvent>), GatewayError> {
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(GatewayError::Url(format!(
                    "unsupported scheme `{other}` (expected ws or wss)"
                )))
            }
        }

        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        tracing::debug!(url = %url, "websocket handshake complete");

        let (event_tx, event_rx) = mpsc::channel(FRAME_BUFFER);
        let (out_tx, out_rx) = mpsc::channel(FRAME_BUFFER);

        if event_tx.send(TransportEvent::Open).await.is_err() {
            return Err(GatewayError::ChannelClosed);
        }

        tokio::spawn(pump(stream, event_tx, out_rx));

        Ok((TransportHandle::new(out_tx), event_rx))
    }
}

/// Drive one socket until either side ends it
async fn pump(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    event_tx: mpsc::Sender<TransportEvent>,
    mut out_rx: mpsc::Receiver<OutboundFrame>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            outbound = out_rx.recv() => match outbound {
                Some(OutboundFrame::Text(text)) => {
                    if sink.send(Message::Text(text)).await.is_err() {
                        let _ = event_tx
                            .send(TransportEvent::Close { code: None, reason: "write failed".to_string() })
                            .await;
                        break;
                    }
                }
                Some(OutboundFrame::Binary(bytes)) => {
                    if sink.send(Message::Binary(bytes)).await.is_err() {
                        let _ = event_tx
                            .send(TransportEvent::Close { code: None, reason: "write failed".to_string() })
                            .await;
                        break;
                    }
                }
                Some(OutboundFrame::Close { code, reason }) => {
                    let frame = CloseFrame {
                        code: code.into(),
                        reason: reason.clone().into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    let _ = event_tx
                        .send(TransportEvent::Close { code: Some(code), reason })
                        .await;
                    break;
                }
                None => {
                    // handle dropped; shut the socket politely
                    let _ = sink.close().await;
                    break;
                }
            },
            incoming = source.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if event_tx.send(TransportEvent::Text(text.to_string())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => {
                    if event_tx.send(TransportEvent::Binary(bytes.to_vec())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // pongs are produced by tungstenite itself
                    tracing::trace!("websocket ping/pong");
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = match frame {
                        Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                        None => (None, String::new()),
                    };
                    tracing::debug!(code = ?code, reason = %reason, "server closed connection");
                    let _ = event_tx.send(TransportEvent::Close { code, reason }).await;
                    break;
                }
                Some(Ok(Message::Frame(_))) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "websocket read error");
                    let _ = event_tx
                        .send(TransportEvent::Close { code: None, reason: e.to_string() })
                        .await;
                    break;
                }
                None => {
                    tracing::debug!("websocket stream ended");
                    let _ = event_tx
                        .send(TransportEvent::Close { code: None, reason: "connection reset".to_string() })
                        .await;
                    break;
                }
            }
        }
    }
}
