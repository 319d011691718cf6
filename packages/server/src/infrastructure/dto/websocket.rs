//! WebSocket event DTOs.
//!
//! Every frame is a JSON object tagged by `"type"` with camelCase fields.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        room_id: String,
        #[serde(default)]
        display_name: String,
    },
    CodeChange {
        room_id: String,
        content: String,
    },
    /// Push the sender's content to one connection (late joiner catch-up)
    SyncRequest {
        target_connection_id: String,
        content: String,
    },
    RunCode {
        content: String,
        #[serde(default)]
        language: String,
    },
    VoiceOffer {
        payload: Value,
        target_connection_id: String,
    },
    VoiceAnswer {
        payload: Value,
        target_connection_id: String,
    },
    VoiceIce {
        payload: Value,
        target_connection_id: String,
    },
}

/// Member entry of a `joined` event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDto {
    pub connection_id: String,
    pub display_name: Option<String>,
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// First frame on every connection: the id the server assigned to it
    Connected {
        connection_id: String,
    },
    Joined {
        members: Vec<MemberDto>,
        new_display_name: String,
        new_connection_id: String,
    },
    CodeChange {
        content: String,
    },
    Left {
        connection_id: String,
        display_name: Option<String>,
    },
    CodeOutput {
        output: String,
    },
    VoiceOffer {
        payload: Value,
        from_connection_id: String,
    },
    VoiceAnswer {
        payload: Value,
        from_connection_id: String,
    },
    VoiceIce {
        payload: Value,
        from_connection_id: String,
    },
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Voice-call negotiation message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    /// Build the event delivered to the target, tagged with the sender's id.
    pub fn relayed(self, payload: Value, from_connection_id: String) -> ServerEvent {
        match self {
            Self::Offer => ServerEvent::VoiceOffer {
                payload,
                from_connection_id,
            },
            Self::Answer => ServerEvent::VoiceAnswer {
                payload,
                from_connection_id,
            },
            Self::IceCandidate => ServerEvent::VoiceIce {
                payload,
                from_connection_id,
            },
        }
    }
}
