//! Transport port for the live chat connection.
//!
//! The core consumes a transport, it never implements one. The socket
//! library behind this contract performs framing, handshake, and delivery;
//! production wires in the real backend client, tests wire in the simulated
//! backend from `partyline-harness`.
//!
//! Lifecycle and inbound traffic arrive as typed [`TransportEvent`]s pushed
//! onto a channel supplied at connect time. A single dispatch loop drains
//! the channel, which preserves the single-consumer, in-order guarantee
//! without a callback object.

use std::sync::Arc;

use async_trait::async_trait;
use partyline_proto::{ClientEnvelope, MessageList, RoomId, ServerEnvelope};
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Events a transport pushes into the dispatch loop, in arrival order.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The connection completed its handshake and can carry traffic.
    Ready,

    /// The connection ended, gracefully or not.
    ///
    /// Also emitted for abnormal termination; the connection manager decides
    /// whether a replacement connection follows.
    Closed,

    /// A protocol envelope arrived.
    Envelope(ServerEnvelope),
}

/// Sink the transport delivers events into.
pub type EventSink = mpsc::UnboundedSender<TransportEvent>;

/// Factory for live connections to the messaging backend.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Open a new connection.
    ///
    /// Events for this connection flow into `events` until a
    /// [`TransportEvent::Closed`] is delivered or the handle is torn down.
    /// The returned handle is the only way to send on the connection.
    async fn connect(&self, events: EventSink) -> Result<Arc<dyn TransportHandle>, TransportError>;
}

/// A live connection to the messaging backend.
#[async_trait]
pub trait TransportHandle: Send + Sync + 'static {
    /// Send an envelope on the live connection.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Closed`] if the connection is gone.
    async fn send(&self, envelope: ClientEnvelope) -> Result<(), TransportError>;

    /// Ask the backend to create a room and join it as `nickname`.
    ///
    /// Resolves with the new room's identifier.
    async fn create_room(
        &self,
        nickname: &str,
        user_icon: Option<&str>,
    ) -> Result<RoomId, TransportError>;

    /// Join an existing room as `nickname`.
    ///
    /// Resolves with the room's current message history.
    async fn join_room(
        &self,
        nickname: &str,
        room_id: &str,
        user_icon: Option<&str>,
    ) -> Result<MessageList, TransportError>;

    /// Release the connection.
    ///
    /// Safe to call more than once; tearing down a dead handle is a no-op.
    fn teardown(&self);
}
