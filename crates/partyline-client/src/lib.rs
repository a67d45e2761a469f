//! Async runtime for the Partyline chat client.
//!
//! The pure state machines live in `partyline-core`; this crate executes
//! them. [`RoomClient`] is the explicit context object the UI layer holds:
//! it owns the connection manager, the durable session store, and the single
//! dispatch loop that serializes UI intents, transport events, and room
//! request completions.
//!
//! # Components
//!
//! - [`ConnectionManager`]: owns the one live transport handle and executes
//!   the reconnect policy
//! - [`RedbMedium`]: durable single-file session medium
//! - [`RoomClient`]: public facade (create/join/leave/send/typing) plus the
//!   observed-state channel the UI renders from

pub mod client;
pub mod manager;
pub mod store;

pub use client::{RoomClient, RoomSnapshot};
pub use manager::ConnectionManager;
pub use store::RedbMedium;
