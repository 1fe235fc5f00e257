//! Gateway transport seam
//!
//! The session engine only ever sees three observable events (`Open`,
//! message, `Close`) plus the emission primitives on `TransportHandle`.
//! Everything socket-specific lives behind `Connector`, which lets tests
//! script a connection without a network.

mod websocket;

pub use websocket::WebSocketConnector;

use crate::error::GatewayError;
use async_trait::async_trait;
use tokio::sync::mpsc;
use url::Url;

/// Events a transport reports to the session engine
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Socket connected and handshake complete
    Open,
    /// One text frame
    Text(String),
    /// One binary frame
    Binary(Vec<u8>),
    /// Connection ended; `code` is absent for raw I/O faults
    Close { code: Option<u16>, reason: String },
}

/// Frames the engine pushes down to the socket
#[derive(Debug, Clone)]
pub enum OutboundFrame {
    Text(String),
    Binary(Vec<u8>),
    Close { code: u16, reason: String },
}

/// Write half of one connection
#[derive(Debug, Clone)]
pub struct TransportHandle {
    tx: mpsc::Sender<OutboundFrame>,
}

impl TransportHandle {
    /// Wrap the outbound channel of a connection
    #[must_use]
    pub fn new(tx: mpsc::Sender<OutboundFrame>) -> Self {
        Self { tx }
    }

    /// Send a text frame
    pub async fn send_text(&self, text: String) -> Result<(), GatewayError> {
        self.send(OutboundFrame::Text(text)).await
    }

    /// Send a binary frame
    pub async fn send_binary(&self, bytes: Vec<u8>) -> Result<(), GatewayError> {
        self.send(OutboundFrame::Binary(bytes)).await
    }

    /// Send any outbound frame
    pub async fn send(&self, frame: OutboundFrame) -> Result<(), GatewayError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| GatewayError::ChannelClosed)
    }

    /// Close the connection
    pub async fn close(&self, code: u16, reason: &str) -> Result<(), GatewayError> {
        self.send(OutboundFrame::Close {
            code,
            reason: reason.to_string(),
        })
        .await
    }

    /// Whether the connection side has gone away
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Produces connections for the session engine
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open one connection to `url`
    ///
    /// The returned receiver yields `Open` first, then messages, then a
    /// final `Close`.
    async fn connect(
        &self,
        url: &Url,
    ) -> Result<(TransportHandle, mpsc::Receiver<TransportEvent>), GatewayError>;
}
