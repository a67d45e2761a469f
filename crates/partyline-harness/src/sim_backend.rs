//! In-memory chat backend.
//!
//! Models the behavior the client cares about: rooms with authoritative
//! message history, backend-attributed messages and timestamps, join/leave
//! system notices, and a per-recipient "anyone else typing" aggregate.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
};

use partyline_core::{
    error::TransportError,
    transport::{EventSink, TransportEvent},
};
use partyline_proto::{ChatMessage, ClientEnvelope, MessageList, RoomId, ServerEnvelope};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Arbitrary base so timestamps look like real epoch milliseconds.
const CLOCK_BASE_MS: u64 = 1_700_000_000_000;

#[derive(Debug)]
struct Membership {
    room_id: RoomId,
    nickname: String,
    user_icon: Option<String>,
    typing: bool,
}

#[derive(Debug)]
struct ConnState {
    sink: EventSink,
    member: Option<Membership>,
    open: bool,
}

#[derive(Debug, Default)]
struct Room {
    history: Vec<ChatMessage>,
    members: Vec<u64>,
}

#[derive(Debug)]
struct Inner {
    rooms: HashMap<RoomId, Room>,
    conns: HashMap<u64, ConnState>,
    next_conn: u64,
    clock_ms: u64,
    rng: ChaCha8Rng,
    refuse_joins: bool,
    join_requests: usize,
    create_requests: usize,
}

/// Shared in-memory backend.
///
/// Clones share the same state, so a backend can outlive any number of
/// client connections — which is exactly what reconnect tests need.
#[derive(Debug, Clone)]
pub struct SimBackend {
    inner: Arc<Mutex<Inner>>,
}

impl SimBackend {
    /// Backend with the default seed.
    pub fn new() -> Self {
        Self::seeded(0)
    }

    /// Backend with a caller-chosen RNG seed for room identifiers.
    pub fn seeded(seed: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                rooms: HashMap::new(),
                conns: HashMap::new(),
                next_conn: 0,
                clock_ms: CLOCK_BASE_MS,
                rng: ChaCha8Rng::seed_from_u64(seed),
                refuse_joins: false,
                join_requests: 0,
                create_requests: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Refuse (or stop refusing) all subsequent join requests.
    pub fn set_refuse_joins(&self, refuse: bool) {
        self.lock().refuse_joins = refuse;
    }

    /// Number of join requests served so far, refused ones included.
    pub fn join_count(&self) -> usize {
        self.lock().join_requests
    }

    /// Number of create requests served so far.
    pub fn create_count(&self) -> usize {
        self.lock().create_requests
    }

    /// Number of currently open connections.
    pub fn live_connection_count(&self) -> usize {
        self.lock().conns.values().filter(|conn| conn.open).count()
    }

    /// Message history of a room, if it exists.
    pub fn room_history(&self, room_id: &str) -> Option<Vec<ChatMessage>> {
        self.lock().rooms.get(room_id).map(|room| room.history.clone())
    }

    /// Abruptly drop every live connection, as a network cut would.
    ///
    /// Each connection gets a [`TransportEvent::Closed`] and its room
    /// membership ends without a leave notice — the backend only learns of
    /// an abrupt drop from the socket, not from the user.
    pub fn sever_all(&self) {
        let mut inner = self.lock();
        let conn_ids: Vec<u64> = inner.conns.keys().copied().collect();
        for conn_id in conn_ids {
            // Only live connections get the cut; a sink left over from an
            // earlier drop must not fire a second close.
            if !inner.conn_open(conn_id) {
                continue;
            }
            inner.drop_conn(conn_id);
            if let Some(conn) = inner.conns.get(&conn_id) {
                let _ = conn.sink.send(TransportEvent::Closed);
            }
        }
        tracing::debug!("severed all connections");
    }

    pub(crate) fn register(&self, sink: EventSink) -> u64 {
        let mut inner = self.lock();
        let conn_id = inner.next_conn;
        inner.next_conn += 1;
        let _ = sink.send(TransportEvent::Ready);
        inner.conns.insert(conn_id, ConnState { sink, member: None, open: true });
        tracing::debug!(conn_id, "connection registered");
        conn_id
    }

    pub(crate) fn create_room(
        &self,
        conn_id: u64,
        nickname: &str,
        user_icon: Option<&str>,
    ) -> Result<RoomId, TransportError> {
        let mut inner = self.lock();
        inner.create_requests += 1;

        if !inner.conn_open(conn_id) {
            return Err(TransportError::Closed);
        }

        let room_id = format!("room-{:08x}", inner.rng.next_u32());
        inner.rooms.insert(room_id.clone(), Room::default());
        // A creator gets no history back, so their own join notice reaches
        // them as a live envelope.
        inner.enter_room(conn_id, &room_id, nickname, user_icon, None);
        tracing::debug!(%room_id, nickname, "room created");
        Ok(room_id)
    }

    pub(crate) fn join_room(
        &self,
        conn_id: u64,
        nickname: &str,
        room_id: &str,
        user_icon: Option<&str>,
    ) -> Result<MessageList, TransportError> {
        let mut inner = self.lock();
        inner.join_requests += 1;

        if !inner.conn_open(conn_id) {
            return Err(TransportError::Closed);
        }
        if inner.refuse_joins {
            return Err(TransportError::Rejected("joins refused".to_string()));
        }
        if !inner.rooms.contains_key(room_id) {
            return Err(TransportError::Rejected(format!("no such room: {room_id}")));
        }

        // The joiner sees their own join notice in the returned history, not
        // as a live envelope — delivering it both ways would duplicate it.
        inner.enter_room(conn_id, room_id, nickname, user_icon, Some(conn_id));
        let history = inner.rooms.get(room_id).map(|room| room.history.clone()).unwrap_or_default();
        tracing::debug!(%room_id, nickname, "join served");
        Ok(MessageList { messages: history })
    }

    pub(crate) fn send(
        &self,
        conn_id: u64,
        envelope: ClientEnvelope,
    ) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if !inner.conn_open(conn_id) {
            return Err(TransportError::Closed);
        }

        match envelope {
            ClientEnvelope::SendMessage { body } => inner.post_message(conn_id, body),
            ClientEnvelope::SetTypingPresence { typing } => inner.set_typing(conn_id, typing),
        }
        Ok(())
    }

    pub(crate) fn teardown(&self, conn_id: u64) {
        let mut inner = self.lock();
        if let Some(member) = inner.drop_conn(conn_id) {
            // A deliberate teardown reaches the backend as a clean close, so
            // the rest of the room hears about it.
            inner.post_system_notice(&member.room_id, &member.nickname, "left the room", None);
        }
        tracing::debug!(conn_id, "connection torn down");
    }
}

impl Default for SimBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    fn conn_open(&self, conn_id: u64) -> bool {
        self.conns.get(&conn_id).is_some_and(|conn| conn.open)
    }

    fn tick_ms(&mut self) -> u64 {
        self.clock_ms += 1000;
        self.clock_ms
    }

    fn enter_room(
        &mut self,
        conn_id: u64,
        room_id: &str,
        nickname: &str,
        user_icon: Option<&str>,
        exclude: Option<u64>,
    ) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.members.push(conn_id);
        }
        if let Some(conn) = self.conns.get_mut(&conn_id) {
            conn.member = Some(Membership {
                room_id: room_id.to_string(),
                nickname: nickname.to_string(),
                user_icon: user_icon.map(str::to_string),
                typing: false,
            });
        }
        self.post_system_notice(room_id, nickname, "joined the room", exclude);
    }

    /// End a connection's membership and mark it closed. Returns the
    /// membership it held, if any.
    fn drop_conn(&mut self, conn_id: u64) -> Option<Membership> {
        let member = self.conns.get_mut(&conn_id).and_then(|conn| {
            conn.open = false;
            conn.member.take()
        })?;

        if let Some(room) = self.rooms.get_mut(&member.room_id) {
            room.members.retain(|id| *id != conn_id);
        }
        // A member who vanishes mid-keystroke must not leave the indicator
        // stuck for everyone else.
        self.broadcast_presence(&member.room_id);
        Some(member)
    }

    fn post_message(&mut self, conn_id: u64, body: String) {
        let Some(member) = self.conns.get(&conn_id).and_then(|conn| conn.member.as_ref()) else {
            // Messages from a connection that never joined go nowhere.
            return;
        };

        let message = ChatMessage {
            user_nickname: member.nickname.clone(),
            user_icon: member.user_icon.clone(),
            body,
            timestamp: 0,
            is_system_message: false,
        };
        let room_id = member.room_id.clone();
        self.deliver(&room_id, message, None);
    }

    fn post_system_notice(
        &mut self,
        room_id: &str,
        nickname: &str,
        what: &str,
        exclude: Option<u64>,
    ) {
        let notice = ChatMessage {
            user_nickname: nickname.to_string(),
            user_icon: None,
            body: format!("{nickname} {what}"),
            timestamp: 0,
            is_system_message: true,
        };
        self.deliver(room_id, notice, exclude);
    }

    /// Stamp a message, append it to room history, and fan it out to every
    /// open member (the sender included) except `exclude`.
    fn deliver(&mut self, room_id: &str, mut message: ChatMessage, exclude: Option<u64>) {
        message.timestamp = self.tick_ms();

        let Some(room) = self.rooms.get_mut(room_id) else {
            return;
        };
        room.history.push(message.clone());

        for conn_id in room.members.clone() {
            if exclude == Some(conn_id) {
                continue;
            }
            if let Some(conn) = self.conns.get(&conn_id) {
                if conn.open {
                    let _ = conn
                        .sink
                        .send(TransportEvent::Envelope(ServerEnvelope::SendMessage(message.clone())));
                }
            }
        }
    }

    fn set_typing(&mut self, conn_id: u64, typing: bool) {
        let Some(room_id) = self
            .conns
            .get_mut(&conn_id)
            .and_then(|conn| conn.member.as_mut())
            .map(|member| {
                member.typing = typing;
                member.room_id.clone()
            })
        else {
            return;
        };
        self.broadcast_presence(&room_id);
    }

    /// Tell each member whether anyone *else* in the room is typing.
    fn broadcast_presence(&mut self, room_id: &str) {
        let Some(room) = self.rooms.get(room_id) else {
            return;
        };

        let typing_members: Vec<u64> = room
            .members
            .iter()
            .copied()
            .filter(|id| {
                self.conns
                    .get(id)
                    .and_then(|conn| conn.member.as_ref())
                    .is_some_and(|member| member.typing)
            })
            .collect();

        for conn_id in room.members.clone() {
            let anyone_typing = typing_members.iter().any(|id| *id != conn_id);
            if let Some(conn) = self.conns.get(&conn_id) {
                if conn.open {
                    let _ = conn.sink.send(TransportEvent::Envelope(
                        ServerEnvelope::SetTypingPresence { anyone_typing },
                    ));
                }
            }
        }
    }
}
