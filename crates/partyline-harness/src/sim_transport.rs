//! Transport implementation over the simulated backend.

use std::sync::Arc;

use async_trait::async_trait;
use partyline_core::{
    error::TransportError,
    transport::{EventSink, Transport, TransportHandle},
};
use partyline_proto::{ClientEnvelope, MessageList, RoomId};

use crate::sim_backend::SimBackend;

/// Connects clients to a [`SimBackend`].
///
/// Every `connect` registers a fresh connection with the shared backend and
/// reports it ready immediately — the simulated network never fails a
/// handshake, so tests script failures through the backend instead.
#[derive(Debug, Clone)]
pub struct SimTransport {
    backend: SimBackend,
}

impl SimTransport {
    /// Transport over the given backend.
    pub fn new(backend: SimBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Transport for SimTransport {
    async fn connect(&self, events: EventSink) -> Result<Arc<dyn TransportHandle>, TransportError> {
        let conn_id = self.backend.register(events);
        Ok(Arc::new(SimHandle { backend: self.backend.clone(), conn_id }))
    }
}

struct SimHandle {
    backend: SimBackend,
    conn_id: u64,
}

#[async_trait]
impl TransportHandle for SimHandle {
    async fn send(&self, envelope: ClientEnvelope) -> Result<(), TransportError> {
        self.backend.send(self.conn_id, envelope)
    }

    async fn create_room(
        &self,
        nickname: &str,
        user_icon: Option<&str>,
    ) -> Result<RoomId, TransportError> {
        self.backend.create_room(self.conn_id, nickname, user_icon)
    }

    async fn join_room(
        &self,
        nickname: &str,
        room_id: &str,
        user_icon: Option<&str>,
    ) -> Result<MessageList, TransportError> {
        self.backend.join_room(self.conn_id, nickname, room_id, user_icon)
    }

    fn teardown(&self) {
        self.backend.teardown(self.conn_id);
    }
}
