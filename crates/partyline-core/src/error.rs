//! Error taxonomy for the session controller and its ports.
//!
//! Only [`RoomError`] is user-facing. Storage trouble is recovered locally
//! (the store falls back to in-memory defaults), and transport trouble is
//! handled transparently by reconnect plus automatic rejoin.

use thiserror::Error;

/// User-facing failures of room operations.
///
/// These are presented to the caller as blocking notices; none of them is
/// fatal to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    /// A room create was attempted while a session already exists.
    ///
    /// The existing session is left untouched; the user must leave the
    /// current room first.
    #[error("already in a room; leave the current room before creating a new one")]
    AlreadyInRoom,

    /// The backend rejected a join or rejoin request.
    ///
    /// The session is cleared so the caller returns to room selection.
    #[error("could not join room: {reason}")]
    RoomJoin {
        /// Backend-supplied rejection reason.
        reason: String,
    },

    /// The backend rejected a room create request.
    #[error("could not create room: {reason}")]
    RoomCreate {
        /// Backend-supplied rejection reason.
        reason: String,
    },
}

/// Failures of the durable session medium.
///
/// Never surfaced to the caller: reads fail soft to an absent record and
/// writes are swallowed after clearing the medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying medium could not be read or written.
    #[error("storage medium failure: {0}")]
    Medium(String),
}

/// Failures reported by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The connection is closed; nothing was delivered.
    #[error("transport connection closed")]
    Closed,

    /// A new connection could not be established.
    #[error("transport connect failed: {0}")]
    Connect(String),

    /// The backend rejected a room request.
    #[error("room request rejected: {0}")]
    Rejected(String),
}
