//! Deterministic simulation harness for Partyline client testing.
//!
//! An in-memory chat backend plus a [`partyline_core::transport::Transport`]
//! implementation over it, for reproducible integration tests without a
//! network: scripted connection drops, join refusal, and request counters
//! for exactly-once assertions.
//!
//! Timestamps come from a monotonic counter and room identifiers from a
//! seeded RNG, so a test run is reproducible byte for byte.

pub mod sim_backend;
pub mod sim_transport;

pub use sim_backend::SimBackend;
pub use sim_transport::SimTransport;
