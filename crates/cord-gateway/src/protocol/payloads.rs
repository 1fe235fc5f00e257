//! Gateway payload definitions
//!
//! Structures for the payloads this client sends and the server payloads
//! it must understand.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hello {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Client connection properties sent with Identify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    pub os: String,
    /// Library name in the browser slot
    pub browser: String,
    /// Library name in the device slot
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "cord".to_string(),
            device: "cord".to_string(),
        }
    }
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identify {
    /// Authentication token
    pub token: String,

    pub properties: IdentifyProperties,

    /// `[shard_index, shard_total]`
    pub shard: [u64; 2],

    #[serde(skip_serializing_if = "Option::is_none")]
    pub large_threshold: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub intents: Option<u64>,
}

/// Payload for op 6 (Resume)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resume {
    /// Authentication token
    pub token: String,

    /// Session ID to resume
    pub session_id: String,

    /// Last received sequence number
    pub seq: u64,
}

/// Payload for op 8 (Request Guild Members)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestGuildMembers {
    pub guild_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    pub limit: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presences: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Payload for op 4 (Voice State Update)
///
/// `channel_id: None` serializes as null and disconnects from voice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceStateUpdate {
    pub guild_id: String,
    pub channel_id: Option<String>,
    pub self_mute: bool,
    pub self_deaf: bool,
}

/// Payload for op 3 (Presence Update)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePresence {
    /// New status (online, idle, dnd, offline)
    pub status: String,

    pub afk: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<u64>,
}

impl UpdatePresence {
    /// Valid status values
    pub const VALID_STATUSES: &'static [&'static str] = &["online", "idle", "dnd", "offline"];

    /// Check if the status is valid
    #[must_use]
    pub fn is_valid_status(&self) -> bool {
        Self::VALID_STATUSES.contains(&self.status.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identify_omits_absent_optionals() {
        let identify = Identify {
            token: "t".to_string(),
            properties: IdentifyProperties::default(),
            shard: [0, 1],
            large_threshold: None,
            presence: None,
            intents: Some(513),
        };

        let json = serde_json::to_value(&identify).unwrap();
        assert_eq!(json["shard"], serde_json::json!([0, 1]));
        assert_eq!(json["intents"], 513);
        assert!(json.get("large_threshold").is_none());
        assert!(json.get("presence").is_none());
    }

    #[test]
    fn test_default_properties_identify_the_library() {
        let props = IdentifyProperties::default();
        assert_eq!(props.browser, "cord");
        assert_eq!(props.device, "cord");
        assert!(!props.os.is_empty());
    }

    #[test]
    fn test_voice_state_null_channel_disconnects() {
        let update = VoiceStateUpdate {
            guild_id: "1".to_string(),
            channel_id: None,
            self_mute: false,
            self_deaf: false,
        };

        let json = serde_json::to_value(&update).unwrap();
        assert!(json["channel_id"].is_null());
    }

    #[test]
    fn test_request_guild_members_omits_absent_fields() {
        let request = RequestGuildMembers {
            guild_id: "9".to_string(),
            limit: 0,
            query: Some(String::new()),
            ..Default::default()
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["query"], "");
        assert!(json.get("user_ids").is_none());
        assert!(json.get("nonce").is_none());
    }

    #[test]
    fn test_presence_status_validation() {
        let valid = UpdatePresence {
            status: "idle".to_string(),
            afk: true,
            game: None,
            since: None,
        };
        assert!(valid.is_valid_status());

        let invalid = UpdatePresence {
            status: "busy".to_string(),
            afk: false,
            game: None,
            since: None,
        };
        assert!(!invalid.is_valid_status());
    }
}
