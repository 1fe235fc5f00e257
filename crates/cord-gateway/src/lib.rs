//! # cord-gateway
//!
//! The gateway half of the cord client: a WebSocket session engine that
//! negotiates the HELLO handshake, drives the heartbeat, identifies or
//! resumes, fans out dispatch events, and recovers from transport and
//! protocol faults with the correct resume-vs-reidentify policy.
//!
//! ## Example
//!
//! ```ignore
//! use cord_gateway::{Shard, ShardConfig};
//!
//! let shard = Shard::new("wss://gateway.cord.chat", ShardConfig::new("my-token"))?;
//! shard.on("MESSAGE_CREATE", |payload| {
//!     println!("message: {payload}");
//! });
//! shard.start().await??;
//! ```

pub mod codec;
pub mod error;
pub mod events;
pub mod protocol;
pub mod session;
pub mod shard;
pub mod transport;

pub use codec::{Encoding, FrameCodec, Inflater, TermCodec, ZLIB_SUFFIX};
pub use error::{GatewayError, GatewayResult};
pub use events::EventEmitter;
pub use protocol::{
    CloseCode, GatewayFrame, Hello, Identify, IdentifyProperties, OpCode, RequestGuildMembers,
    Resume, UpdatePresence, VoiceStateUpdate,
};
pub use session::Session;
pub use shard::{Shard, ShardConfig};
pub use transport::{Connector, OutboundFrame, TransportEvent, TransportHandle, WebSocketConnector};
