//! The `{type, data}` envelope wrapping all bidirectional traffic.
//!
//! # Protocol Flow
//!
//! Clients send thin intents: a message body, or a typing flag. The backend
//! attributes and timestamps messages and aggregates typing presence across
//! the room, so inbound payloads are richer than their outbound
//! counterparts. The two directions therefore get separate enums with the
//! same `type` tags.

use serde::{Deserialize, Serialize};

use crate::{
    errors::{ProtocolError, Result},
    message::ChatMessage,
};

/// Outbound envelope: client intent sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientEnvelope {
    /// Post a message to the active room.
    #[serde(rename = "SEND_MESSAGE")]
    SendMessage {
        /// Message text.
        body: String,
    },

    /// Report whether this client is currently typing.
    ///
    /// Edge-triggered by the caller; the protocol applies no debouncing and
    /// duplicate transitions are sent as-is.
    #[serde(rename = "SET_TYPING_PRESENCE")]
    SetTypingPresence {
        /// True while the local user is typing.
        typing: bool,
    },
}

impl ClientEnvelope {
    /// Serialize to the JSON wire form.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse from the JSON wire form.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(ProtocolError::Decode)
    }
}

/// Inbound envelope: event delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerEnvelope {
    /// A message was posted to the room (including the sender's own).
    #[serde(rename = "SEND_MESSAGE")]
    SendMessage(ChatMessage),

    /// The room-wide typing aggregate changed.
    #[serde(rename = "SET_TYPING_PRESENCE")]
    SetTypingPresence {
        /// True while anyone else in the room is typing.
        #[serde(rename = "anyoneTyping")]
        anyone_typing: bool,
    },
}

impl ServerEnvelope {
    /// Serialize to the JSON wire form.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// Parse from the JSON wire form.
    pub fn decode(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_message_wire_shape() {
        let envelope = ClientEnvelope::SendMessage { body: "hi".to_string() };
        assert_eq!(envelope.encode().unwrap(), r#"{"type":"SEND_MESSAGE","data":{"body":"hi"}}"#);
    }

    #[test]
    fn outbound_typing_wire_shape() {
        let envelope = ClientEnvelope::SetTypingPresence { typing: true };
        assert_eq!(
            envelope.encode().unwrap(),
            r#"{"type":"SET_TYPING_PRESENCE","data":{"typing":true}}"#
        );
    }

    #[test]
    fn inbound_message_decodes() {
        let raw = concat!(
            r#"{"type":"SEND_MESSAGE","data":{"userNickname":"ada","#,
            r#""body":"hello","timestamp":7,"isSystemMessage":false}}"#
        );

        let envelope = ServerEnvelope::decode(raw).unwrap();
        match envelope {
            ServerEnvelope::SendMessage(message) => {
                assert_eq!(message.user_nickname, "ada");
                assert_eq!(message.body, "hello");
                assert_eq!(message.user_icon, None);
            },
            ServerEnvelope::SetTypingPresence { .. } => panic!("wrong envelope kind"),
        }
    }

    #[test]
    fn inbound_presence_decodes() {
        let raw = r#"{"type":"SET_TYPING_PRESENCE","data":{"anyoneTyping":true}}"#;
        let envelope = ServerEnvelope::decode(raw).unwrap();
        assert_eq!(envelope, ServerEnvelope::SetTypingPresence { anyone_typing: true });
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let raw = r#"{"type":"KICK_USER","data":{}}"#;
        assert!(matches!(ServerEnvelope::decode(raw), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn client_envelope_round_trips() {
        let envelope = ClientEnvelope::SetTypingPresence { typing: false };
        let decoded = ClientEnvelope::decode(&envelope.encode().unwrap()).unwrap();
        assert_eq!(decoded, envelope);
    }
}
