//! Gateway frame envelope
//!
//! All messages on the WebSocket follow the `{op, t?, s?, d?}` shape.

use super::{Hello, OpCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One gateway message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayFrame {
    /// Operation code
    pub op: OpCode,

    /// Event type (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Value>,
}

impl GatewayFrame {
    // === Client sends ===

    /// Any client command: `{op, d}`
    #[must_use]
    pub fn command(op: OpCode, data: Value) -> Self {
        Self {
            op,
            t: None,
            s: None,
            d: Some(data),
        }
    }

    /// Heartbeat (op=1) carrying the last received sequence
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self {
            op: OpCode::Heartbeat,
            t: None,
            s: None,
            d: Some(last_sequence.map_or(Value::Null, |s| Value::Number(s.into()))),
        }
    }

    // === Server frame accessors ===

    /// Try to parse as a Hello payload (op=10)
    #[must_use]
    pub fn as_hello(&self) -> Option<Hello> {
        if self.op != OpCode::Hello {
            return None;
        }
        self.d.as_ref().and_then(|d| serde_json::from_value(d.clone()).ok())
    }

    /// The resumable flag of an Invalid Session frame (op=9)
    #[must_use]
    pub fn invalid_session_resumable(&self) -> Option<bool> {
        if self.op != OpCode::InvalidSession {
            return None;
        }
        Some(self.d.as_ref().and_then(Value::as_bool).unwrap_or(false))
    }

    /// Dispatch event name, when this is an op=0 frame
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        if self.op != OpCode::Dispatch {
            return None;
        }
        self.t.as_deref()
    }

    /// The `session_id` field of a READY dispatch payload
    #[must_use]
    pub fn ready_session_id(&self) -> Option<String> {
        self.d
            .as_ref()
            .and_then(|d| d.get("session_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    // === Utilities ===

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for GatewayFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(t) = &self.t {
            write!(f, "GatewayFrame(op={}, t={}", self.op, t)?;
            if let Some(s) = self.s {
                write!(f, ", s={s}")?;
            }
            write!(f, ")")
        } else {
            write!(f, "GatewayFrame(op={})", self.op)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_heartbeat_carries_sequence_or_null() {
        let frame = GatewayFrame::heartbeat(Some(41));
        assert_eq!(frame.to_json().unwrap(), r#"{"op":1,"d":41}"#);

        let frame = GatewayFrame::heartbeat(None);
        assert_eq!(frame.to_json().unwrap(), r#"{"op":1,"d":null}"#);
    }

    #[test]
    fn test_parse_hello() {
        let frame = GatewayFrame::from_json(r#"{"op":10,"d":{"heartbeat_interval":45000}}"#).unwrap();
        let hello = frame.as_hello().unwrap();
        assert_eq!(hello.heartbeat_interval, 45_000);

        let not_hello = GatewayFrame::from_json(r#"{"op":11}"#).unwrap();
        assert!(not_hello.as_hello().is_none());
    }

    #[test]
    fn test_parse_dispatch() {
        let frame = GatewayFrame::from_json(
            r#"{"op":0,"t":"READY","s":1,"d":{"session_id":"abc","v":10}}"#,
        )
        .unwrap();

        assert_eq!(frame.event_name(), Some("READY"));
        assert_eq!(frame.s, Some(1));
        assert_eq!(frame.ready_session_id(), Some("abc".to_string()));
    }

    #[test]
    fn test_invalid_session_resumable_flag() {
        let frame = GatewayFrame::from_json(r#"{"op":9,"d":true}"#).unwrap();
        assert_eq!(frame.invalid_session_resumable(), Some(true));

        let frame = GatewayFrame::from_json(r#"{"op":9,"d":false}"#).unwrap();
        assert_eq!(frame.invalid_session_resumable(), Some(false));

        // absent d degrades to not-resumable
        let frame = GatewayFrame::from_json(r#"{"op":9}"#).unwrap();
        assert_eq!(frame.invalid_session_resumable(), Some(false));
    }

    #[test]
    fn test_command_roundtrip() {
        let frame = GatewayFrame::command(OpCode::Identify, json!({"token": "t"}));
        let parsed = GatewayFrame::from_json(&frame.to_json().unwrap()).unwrap();

        assert_eq!(parsed.op, OpCode::Identify);
        assert_eq!(parsed.d.unwrap()["token"], "t");
        assert!(parsed.t.is_none());
    }

    #[test]
    fn test_display() {
        let dispatch = GatewayFrame {
            op: OpCode::Dispatch,
            t: Some("MESSAGE_CREATE".to_string()),
            s: Some(5),
            d: None,
        };
        let display = format!("{dispatch}");
        assert!(display.contains("MESSAGE_CREATE"));
        assert!(display.contains("s=5"));
    }
}
