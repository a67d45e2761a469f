//! Wire format for the Partyline chat protocol.
//!
//! Everything on the live connection travels as a `{ "type": KIND, "data":
//! payload }` JSON envelope. Inbound and outbound payloads differ for the
//! same kind (clients send a bare message body, the backend echoes a fully
//! attributed [`ChatMessage`]), so the envelope is split by direction into
//! [`ClientEnvelope`] and [`ServerEnvelope`].
//!
//! Room creation and joining are request/response operations carried outside
//! the envelope framing; their reply payloads ([`MessageList`]) live here so
//! every layer agrees on the data shapes.
//!
//! All decoding returns [`ProtocolError`] on malformed input. No parsing
//! path panics.

pub mod envelope;
pub mod errors;
pub mod message;

pub use envelope::{ClientEnvelope, ServerEnvelope};
pub use errors::{ProtocolError, Result};
pub use message::{ChatMessage, MessageList, RoomId};
