//! Chat message payload types.
//!
//! Field names are camelCase on the wire, matching the backend's JSON. The
//! optional avatar is omitted entirely when absent rather than serialized as
//! `null`.

use serde::{Deserialize, Serialize};

/// Identifier of a chat room, assigned by the backend on creation.
pub type RoomId = String;

/// A single chat message as delivered by the backend.
///
/// Messages are immutable once received. System notices (join/leave
/// announcements) arrive through the same channel with
/// [`is_system_message`](Self::is_system_message) set; they are stored
/// identically and only rendered differently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Display name of the sender (or the subject of a system notice).
    pub user_nickname: String,

    /// Avatar identifier chosen by the sender, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_icon: Option<String>,

    /// Message text.
    pub body: String,

    /// Server-assigned timestamp, milliseconds since the Unix epoch.
    pub timestamp: u64,

    /// True for backend-generated notices such as join/leave announcements.
    pub is_system_message: bool,
}

/// Reply payload of a join request: the room's current message history.
///
/// The history is authoritative. A joining or rejoining client replaces its
/// local log with this list wholesale; it is never merged with messages
/// buffered before a disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageList {
    /// Messages in the order the backend recorded them.
    pub messages: Vec<ChatMessage>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_uses_camel_case_field_names() {
        let message = ChatMessage {
            user_nickname: "ada".to_string(),
            user_icon: Some("owl".to_string()),
            body: "hello".to_string(),
            timestamp: 1_700_000_000_000,
            is_system_message: false,
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["userNickname"], "ada");
        assert_eq!(json["userIcon"], "owl");
        assert_eq!(json["isSystemMessage"], false);
    }

    #[test]
    fn absent_icon_is_omitted() {
        let message = ChatMessage {
            user_nickname: "ada".to_string(),
            user_icon: None,
            body: "hello".to_string(),
            timestamp: 0,
            is_system_message: false,
        };

        let json = serde_json::to_value(&message).unwrap();
        assert!(json.get("userIcon").is_none());

        // And a message without the field still decodes.
        let decoded: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.user_icon, None);
    }

    #[test]
    fn message_list_round_trips() {
        let list = MessageList {
            messages: vec![ChatMessage {
                user_nickname: "ada".to_string(),
                user_icon: None,
                body: "hi".to_string(),
                timestamp: 42,
                is_system_message: true,
            }],
        };

        let json = serde_json::to_string(&list).unwrap();
        let decoded: MessageList = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, list);
    }
}
