//! Connection lifecycle state machine.
//!
//! # Architecture: Action-Based State Machine
//!
//! This machine follows the action pattern used throughout the core:
//! methods mutate state and return declarative actions for the driver (the
//! connection manager) to execute. The machine itself never touches a
//! socket.
//!
//! # State Machine
//!
//! ```text
//! ┌──────────────┐ begin_connect ┌────────────┐  ready   ┌──────┐
//! │ Disconnected │──────────────>│ Connecting │─────────>│ Open │
//! └──────────────┘               └────────────┘          └──────┘
//!        ^                                                  │
//!        │            closed / teardown                     │
//!        └──────────────────────────────────────────────────┘
//! ```
//!
//! A `closed` transition requests an immediate replacement connection — no
//! backoff, no retry cap. Teardown is the operator-initiated variant: it
//! suppresses reconnection until the next explicit `begin_connect`.

/// Actions returned by the connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a new transport connection to replace the lost one.
    Reconnect,
}

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No live connection.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The connection is ready to carry traffic.
    Open,
}

/// Connection lifecycle machine.
///
/// Exactly one instance is alive per client; it tracks the single transport
/// handle's lifecycle and decides when a replacement connection must be
/// opened.
#[derive(Debug, Clone)]
pub struct Connection {
    state: ConnectionState,
    torn_down: bool,
}

impl Connection {
    /// Create a machine in the Disconnected state.
    pub fn new() -> Self {
        Self { state: ConnectionState::Disconnected, torn_down: false }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// True when the connection can carry traffic.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// A connection attempt is starting.
    ///
    /// Also re-arms reconnection after a previous teardown, making an
    /// explicit restart part of the lifecycle contract.
    pub fn begin_connect(&mut self) {
        self.torn_down = false;
        self.state = ConnectionState::Connecting;
    }

    /// The transport reported the connection ready.
    ///
    /// Ignored after teardown: the handle was already released and a late
    /// ready must not resurrect it.
    pub fn ready(&mut self) {
        if !self.torn_down {
            self.state = ConnectionState::Open;
        }
    }

    /// The transport reported the connection closed, gracefully or not.
    ///
    /// Returns [`ConnectionAction::Reconnect`] unless the close was the
    /// result of a teardown.
    pub fn closed(&mut self) -> Vec<ConnectionAction> {
        self.state = ConnectionState::Disconnected;
        if self.torn_down { Vec::new() } else { vec![ConnectionAction::Reconnect] }
    }

    /// Operator-initiated shutdown: no reconnection follows.
    ///
    /// Idempotent — tearing down with no live connection is a no-op.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.state = ConnectionState::Disconnected;
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}
