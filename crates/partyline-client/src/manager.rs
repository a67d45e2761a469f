//! Connection manager: the driver of the connection state machine.
//!
//! Owns the transport and the single live handle. The pure machine in
//! `partyline_core::connection` decides *whether* a replacement connection
//! follows a close; this manager performs the actual connects, sends, and
//! teardowns.

use std::sync::Arc;

use partyline_core::{
    connection::{Connection, ConnectionAction, ConnectionState},
    transport::{EventSink, Transport, TransportEvent, TransportHandle},
};
use partyline_proto::ClientEnvelope;

/// Maintains exactly one live transport connection.
pub struct ConnectionManager {
    transport: Arc<dyn Transport>,
    events: EventSink,
    machine: Connection,
    handle: Option<Arc<dyn TransportHandle>>,
}

impl ConnectionManager {
    /// Manager over `transport`, delivering connection events into `events`.
    pub fn new(transport: Arc<dyn Transport>, events: EventSink) -> Self {
        Self { transport, events, machine: Connection::new(), handle: None }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    /// True when the connection can carry traffic.
    pub fn is_open(&self) -> bool {
        self.machine.is_open()
    }

    /// The live handle, for request tasks that outlive one loop turn.
    ///
    /// The clone stays valid from the task's point of view even if the
    /// connection dies underneath it; the request then fails and its stale
    /// outcome is discarded upstream.
    pub fn live_handle(&self) -> Option<Arc<dyn TransportHandle>> {
        self.handle.clone()
    }

    /// Open a new connection.
    ///
    /// A connect failure is reported as a [`TransportEvent::Closed`] on the
    /// event channel, which routes it through the same reconnect decision a
    /// dropped connection takes.
    pub async fn start(&mut self) {
        self.machine.begin_connect();
        match self.transport.connect(self.events.clone()).await {
            Ok(handle) => {
                self.handle = Some(handle);
            },
            Err(error) => {
                tracing::warn!(%error, "transport connect failed");
                let _ = self.events.send(TransportEvent::Closed);
            },
        }
    }

    /// The transport reported the connection ready.
    pub fn on_ready(&mut self) {
        self.machine.ready();
    }

    /// The transport reported the connection closed.
    ///
    /// Unless the close followed a teardown, a replacement connection is
    /// opened immediately — no backoff, no retry cap.
    pub async fn on_closed(&mut self) {
        self.handle = None;
        for action in self.machine.closed() {
            match action {
                ConnectionAction::Reconnect => {
                    tracing::debug!("connection lost, reconnecting");
                    self.start().await;
                },
            }
        }
    }

    /// Send an envelope if the connection is open; drop it silently
    /// otherwise.
    ///
    /// Outbound traffic issued while disconnected is lost by design — there
    /// is no queue and no error.
    pub async fn send(&mut self, envelope: ClientEnvelope) {
        if !self.machine.is_open() {
            tracing::debug!("dropping envelope while disconnected");
            return;
        }
        if let Some(handle) = &self.handle {
            if let Err(error) = handle.send(envelope).await {
                tracing::warn!(%error, "envelope send failed");
            }
        }
    }

    /// Release the connection and suppress reconnection.
    ///
    /// Idempotent: tearing down with no live handle is a no-op.
    pub fn teardown(&mut self) {
        self.machine.teardown();
        if let Some(handle) = self.handle.take() {
            handle.teardown();
        }
    }
}
