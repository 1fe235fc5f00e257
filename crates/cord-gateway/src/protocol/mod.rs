//! Gateway wire protocol
//!
//! Op codes, close codes, payload structures, and the frame envelope.

mod close_codes;
mod frame;
mod opcodes;
mod payloads;

pub use close_codes::CloseCode;
pub use frame::GatewayFrame;
pub use opcodes::OpCode;
pub use payloads::{
    Hello, Identify, IdentifyProperties, RequestGuildMembers, Resume, UpdatePresence,
    VoiceStateUpdate,
};

/// Dispatch event name that completes the identify handshake
pub const EVENT_READY: &str = "READY";

/// Dispatch event name that completes the resume handshake
pub const EVENT_RESUMED: &str = "RESUMED";
