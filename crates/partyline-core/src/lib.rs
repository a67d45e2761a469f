//! Partyline chat client core logic
//!
//! Pure state machine logic for the room session controller, completely
//! decoupled from I/O. This enables deterministic testing of every lifecycle
//! path, including the awkward ones (disconnect mid-join, leave with a
//! request in flight) that are hard to reproduce against a live backend.
//!
//! # Architecture
//!
//! State transitions produce declarative actions that describe intended
//! effects rather than executing them directly. A runtime (the
//! `partyline-client` crate in production, plain test code otherwise) is
//! responsible for interpreting and executing these actions and for feeding
//! request outcomes back in as events.
//!
//! Asynchronous room requests are tagged with a generation counter when they
//! are issued. A completion whose generation no longer matches the pending
//! request — because the user left the room or a newer request superseded it
//! in the meantime — is discarded without effect.
//!
//! # Components
//!
//! - [`connection`]: Connection lifecycle state machine (reconnect policy)
//! - [`controller`]: Room session controller (create/join/leave/send/typing)
//! - [`log`]: Ordered message log for the active room
//! - [`presence`]: Room-wide typing presence flag
//! - [`session`]: The persisted room membership record
//! - [`storage`]: Durable session persistence (medium trait + policy layer)
//! - [`transport`]: Transport port contract (connect/send/teardown, room ops)
//! - [`error`]: Error taxonomy

pub mod connection;
pub mod controller;
pub mod error;
pub mod log;
pub mod presence;
pub mod session;
pub mod storage;
pub mod transport;
