//! The persisted room membership record.

use partyline_proto::RoomId;
use serde::{Deserialize, Serialize};

/// The room the client currently believes itself to be a member of.
///
/// At most one session exists at a time; the controller is its only writer.
/// A session is created on a successful create or join and cleared only on
/// an explicit leave (or a rejected join) — a dropped connection must never
/// clear it, since surviving drops is the whole point of persisting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Backend-assigned room identifier.
    pub room_id: RoomId,

    /// Display name the user joined under.
    pub nickname: String,

    /// Avatar identifier chosen at join time, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_icon: Option<String>,
}
