//! Room session controller.
//!
//! Top-level orchestrator of the chat client: it owns the session record,
//! the message log, and the presence flag, and mediates between UI intents
//! (create/join/leave/send/typing), connection lifecycle changes, and the
//! inbound event stream.
//!
//! # Architecture: Action-Based State Machine
//!
//! [`RoomController::handle`] consumes one [`RoomEvent`] and returns the
//! [`RoomAction`]s the runtime must execute. Room requests are asynchronous
//! at the transport: the controller emits a `Request*` action tagged with a
//! fresh generation number, the runtime performs the request, and feeds the
//! result back as a `*Outcome` event carrying the same generation. Leaving
//! the room (or issuing a newer request) bumps the generation, so an
//! outcome for a superseded request is recognized and discarded instead of
//! resurrecting state the user already abandoned.
//!
//! # Phases
//!
//! ```text
//!            create/join            outcome ok
//! ┌───────────┐ ──────────> ┌─────────┐ ─────────> ┌────────┐
//! │ NoSession │             │ Joining │            │ InRoom │
//! └───────────┘ <────────── └─────────┘            └────────┘
//!       ^        outcome err                          │   ^
//!       │                                      closed │   │ rejoin ok
//!       │ leave / rejoin err               then ready v   │
//!       └────────────────────────────────────── ┌───────────┐
//!                                               │ Rejoining │
//!                                               └───────────┘
//! ```
//!
//! A client that starts with a persisted session begins in `Rejoining`: the
//! join fires as soon as the connection reports ready.

use partyline_proto::{ChatMessage, MessageList, RoomId, ServerEnvelope};

use crate::{
    error::RoomError, log::MessageLog, presence::PresenceTracker, session::Session,
};

/// Session phase of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// No room membership and none being established.
    NoSession,
    /// An explicit create or join request is in flight.
    Joining,
    /// Session set and connection usable.
    InRoom,
    /// Automatic re-join after a reconnect (or at startup from a persisted
    /// session) is pending or in flight.
    Rejoining,
}

/// Inputs to the controller: UI intents, connection lifecycle changes,
/// request completions, and inbound envelopes.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    /// UI intent: create a room and join it.
    Create {
        /// Display name to join under.
        nickname: String,
        /// Avatar identifier, if chosen.
        user_icon: Option<String>,
    },

    /// UI intent: join an existing room.
    Join {
        /// Room to join.
        room_id: RoomId,
        /// Display name to join under.
        nickname: String,
        /// Avatar identifier, if chosen.
        user_icon: Option<String>,
    },

    /// UI intent: leave the room and tear the connection down.
    Leave,

    /// UI intent: post a message to the active room.
    Send {
        /// Message text.
        body: String,
    },

    /// UI intent: report a typing transition.
    SetTyping {
        /// True while the local user is typing.
        typing: bool,
    },

    /// The connection became ready to carry traffic.
    Ready,

    /// The connection dropped.
    Closed,

    /// A create request completed.
    CreateOutcome {
        /// Generation the request was issued under.
        epoch: u64,
        /// New room id, or the backend's rejection reason.
        outcome: Result<RoomId, String>,
    },

    /// A join request completed.
    JoinOutcome {
        /// Generation the request was issued under.
        epoch: u64,
        /// Room history, or the backend's rejection reason.
        outcome: Result<MessageList, String>,
    },

    /// An envelope arrived on the live connection.
    Envelope(ServerEnvelope),
}

/// Effects the runtime must execute on the controller's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomAction {
    /// Perform the asynchronous create request and feed the result back as
    /// [`RoomEvent::CreateOutcome`] with the same epoch.
    RequestCreate {
        /// Generation tag for the outcome event.
        epoch: u64,
        /// Display name to join under.
        nickname: String,
        /// Avatar identifier, if chosen.
        user_icon: Option<String>,
    },

    /// Perform the asynchronous join request and feed the result back as
    /// [`RoomEvent::JoinOutcome`] with the same epoch.
    RequestJoin {
        /// Generation tag for the outcome event.
        epoch: u64,
        /// Room to join.
        room_id: RoomId,
        /// Display name to join under.
        nickname: String,
        /// Avatar identifier, if chosen.
        user_icon: Option<String>,
    },

    /// Send an envelope on the live connection.
    SendEnvelope(partyline_proto::ClientEnvelope),

    /// Write the session record to durable storage.
    PersistSession(Session),

    /// Remove the session record from durable storage.
    ClearSession,

    /// Tear the connection down; no reconnection follows.
    Teardown,
}

/// A create or join request issued but not yet completed.
#[derive(Debug, Clone)]
struct PendingRequest {
    epoch: u64,
    /// Target room; `None` until a create request returns one.
    room_id: Option<RoomId>,
    nickname: String,
    user_icon: Option<String>,
}

/// Top-level session state machine.
///
/// Owns the session record, message log, and presence flag. Holds no I/O;
/// the runtime executes the returned actions and reports request outcomes
/// and transport events back in.
#[derive(Debug)]
pub struct RoomController {
    phase: RoomPhase,
    session: Option<Session>,
    connected: bool,
    epoch: u64,
    pending: Option<PendingRequest>,
    log: MessageLog,
    presence: PresenceTracker,
}

impl RoomController {
    /// Create a controller with no session.
    pub fn new() -> Self {
        Self {
            phase: RoomPhase::NoSession,
            session: None,
            connected: false,
            epoch: 0,
            pending: None,
            log: MessageLog::new(),
            presence: PresenceTracker::new(),
        }
    }

    /// Create a controller resuming a persisted session.
    ///
    /// The controller starts in [`RoomPhase::Rejoining`]; the join request
    /// fires automatically once the connection reports ready.
    pub fn resume(session: Session) -> Self {
        let mut controller = Self::new();
        controller.session = Some(session);
        controller.phase = RoomPhase::Rejoining;
        controller
    }

    /// Current phase.
    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// True while the connection can carry traffic.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Messages of the active room, in arrival order.
    pub fn messages(&self) -> &[ChatMessage] {
        self.log.entries()
    }

    /// True while anyone else in the room is typing.
    pub fn anyone_typing(&self) -> bool {
        self.presence.anyone_typing()
    }

    /// Process one event and return the effects to execute.
    ///
    /// # Errors
    ///
    /// Returns [`RoomError::AlreadyInRoom`] for a create issued while a
    /// session exists. Request rejections do not surface here — they reach
    /// the caller through the runtime, which observed the rejection when it
    /// produced the outcome event.
    pub fn handle(&mut self, event: RoomEvent) -> Result<Vec<RoomAction>, RoomError> {
        match event {
            RoomEvent::Create { nickname, user_icon } => self.on_create(nickname, user_icon),
            RoomEvent::Join { room_id, nickname, user_icon } => {
                Ok(self.on_join(room_id, nickname, user_icon))
            },
            RoomEvent::Leave => Ok(self.on_leave()),
            RoomEvent::Send { body } => Ok(self.on_send(body)),
            RoomEvent::SetTyping { typing } => Ok(self.on_set_typing(typing)),
            RoomEvent::Ready => Ok(self.on_ready()),
            RoomEvent::Closed => {
                self.connected = false;
                Ok(Vec::new())
            },
            RoomEvent::CreateOutcome { epoch, outcome } => Ok(self.on_create_outcome(epoch, outcome)),
            RoomEvent::JoinOutcome { epoch, outcome } => Ok(self.on_join_outcome(epoch, outcome)),
            RoomEvent::Envelope(envelope) => {
                self.on_envelope(envelope);
                Ok(Vec::new())
            },
        }
    }

    fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    fn take_matching(&mut self, epoch: u64) -> Option<PendingRequest> {
        if self.pending.as_ref().is_some_and(|p| p.epoch == epoch) {
            self.pending.take()
        } else {
            None
        }
    }

    fn on_create(
        &mut self,
        nickname: String,
        user_icon: Option<String>,
    ) -> Result<Vec<RoomAction>, RoomError> {
        if self.session.is_some() {
            return Err(RoomError::AlreadyInRoom);
        }

        let epoch = self.next_epoch();
        self.pending = Some(PendingRequest {
            epoch,
            room_id: None,
            nickname: nickname.clone(),
            user_icon: user_icon.clone(),
        });
        self.phase = RoomPhase::Joining;

        Ok(vec![RoomAction::RequestCreate { epoch, nickname, user_icon }])
    }

    fn on_join(
        &mut self,
        room_id: RoomId,
        nickname: String,
        user_icon: Option<String>,
    ) -> Vec<RoomAction> {
        // An explicit join while disconnected is silently dropped, like any
        // other outbound action issued without a usable connection.
        if !self.connected {
            return Vec::new();
        }

        let epoch = self.next_epoch();
        self.pending = Some(PendingRequest {
            epoch,
            room_id: Some(room_id.clone()),
            nickname: nickname.clone(),
            user_icon: user_icon.clone(),
        });
        self.phase = RoomPhase::Joining;

        vec![RoomAction::RequestJoin { epoch, room_id, nickname, user_icon }]
    }

    fn on_leave(&mut self) -> Vec<RoomAction> {
        // Invalidate any in-flight request before dropping state.
        self.epoch += 1;
        self.pending = None;
        self.session = None;
        self.connected = false;
        self.log.clear();
        self.presence.clear();
        self.phase = RoomPhase::NoSession;

        vec![RoomAction::Teardown, RoomAction::ClearSession]
    }

    fn on_send(&mut self, body: String) -> Vec<RoomAction> {
        if self.session.is_none() || !self.connected {
            return Vec::new();
        }
        vec![RoomAction::SendEnvelope(partyline_proto::ClientEnvelope::SendMessage { body })]
    }

    fn on_set_typing(&mut self, typing: bool) -> Vec<RoomAction> {
        if self.session.is_none() || !self.connected {
            return Vec::new();
        }
        // Every reported transition goes out as-is; deduplication is the
        // caller's concern, not the controller's.
        vec![RoomAction::SendEnvelope(partyline_proto::ClientEnvelope::SetTypingPresence {
            typing,
        })]
    }

    fn on_ready(&mut self) -> Vec<RoomAction> {
        self.connected = true;

        // A session on record means this ready follows a reconnect or a
        // restart: re-establish membership with the stored credentials.
        let Some(session) = self.session.clone() else {
            return Vec::new();
        };

        let epoch = self.next_epoch();
        self.pending = Some(PendingRequest {
            epoch,
            room_id: Some(session.room_id.clone()),
            nickname: session.nickname.clone(),
            user_icon: session.user_icon.clone(),
        });
        self.phase = RoomPhase::Rejoining;

        vec![RoomAction::RequestJoin {
            epoch,
            room_id: session.room_id,
            nickname: session.nickname,
            user_icon: session.user_icon,
        }]
    }

    fn on_create_outcome(&mut self, epoch: u64, outcome: Result<RoomId, String>) -> Vec<RoomAction> {
        let Some(pending) = self.take_matching(epoch) else {
            return Vec::new();
        };

        match outcome {
            Ok(room_id) => {
                let session = Session {
                    room_id,
                    nickname: pending.nickname,
                    user_icon: pending.user_icon,
                };
                self.session = Some(session.clone());
                self.phase = RoomPhase::InRoom;
                vec![RoomAction::PersistSession(session)]
            },
            Err(_) => {
                // Rejection leaves no session behind; the runtime surfaces
                // the failure to the caller.
                self.phase = RoomPhase::NoSession;
                Vec::new()
            },
        }
    }

    fn on_join_outcome(
        &mut self,
        epoch: u64,
        outcome: Result<MessageList, String>,
    ) -> Vec<RoomAction> {
        let Some(pending) = self.take_matching(epoch) else {
            return Vec::new();
        };

        match outcome {
            Ok(history) => {
                let mut actions = Vec::new();

                // A rejoin arrives with the session already set; only an
                // explicit first join establishes it. Never overwrite the
                // stored identity.
                if self.session.is_none() {
                    let Some(room_id) = pending.room_id else {
                        // A join outcome can only pair with a join request.
                        return Vec::new();
                    };
                    let session = Session {
                        room_id,
                        nickname: pending.nickname,
                        user_icon: pending.user_icon,
                    };
                    self.session = Some(session.clone());
                    actions.push(RoomAction::PersistSession(session));
                }

                // The server history is authoritative: replace, never merge
                // with messages buffered before a disconnect.
                self.log.replace(history.messages);
                self.phase = RoomPhase::InRoom;
                actions
            },
            Err(_) => {
                // Rejected join (or rejoin): drop membership so the UI
                // returns to room selection. The log keeps its pre-call
                // contents.
                self.session = None;
                self.phase = RoomPhase::NoSession;
                vec![RoomAction::ClearSession]
            },
        }
    }

    fn on_envelope(&mut self, envelope: ServerEnvelope) {
        match envelope {
            ServerEnvelope::SendMessage(message) => self.log.append(message),
            ServerEnvelope::SetTypingPresence { anyone_typing } => {
                self.presence.set(anyone_typing);
            },
        }
    }
}

impl Default for RoomController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use partyline_proto::ClientEnvelope;

    use super::*;

    fn message(body: &str) -> ChatMessage {
        ChatMessage {
            user_nickname: "bea".to_string(),
            user_icon: None,
            body: body.to_string(),
            timestamp: 0,
            is_system_message: false,
        }
    }

    fn session(room_id: &str) -> Session {
        Session {
            room_id: room_id.to_string(),
            nickname: "ada".to_string(),
            user_icon: Some("owl".to_string()),
        }
    }

    /// Connected controller with no session.
    fn connected() -> RoomController {
        let mut controller = RoomController::new();
        controller.handle(RoomEvent::Ready).unwrap();
        controller
    }

    /// Controller that created "room-1" and is in the room.
    fn in_room() -> RoomController {
        let mut controller = connected();
        let actions = controller
            .handle(RoomEvent::Create { nickname: "ada".to_string(), user_icon: None })
            .unwrap();
        let epoch = request_create_epoch(&actions);
        controller
            .handle(RoomEvent::CreateOutcome { epoch, outcome: Ok("room-1".to_string()) })
            .unwrap();
        controller
    }

    fn request_create_epoch(actions: &[RoomAction]) -> u64 {
        match actions {
            [RoomAction::RequestCreate { epoch, .. }] => *epoch,
            other => panic!("expected a single RequestCreate, got {other:?}"),
        }
    }

    fn request_join_epoch(actions: &[RoomAction]) -> u64 {
        match actions {
            [RoomAction::RequestJoin { epoch, .. }] => *epoch,
            other => panic!("expected a single RequestJoin, got {other:?}"),
        }
    }

    #[test]
    fn create_success_persists_session_and_enters_room() {
        let mut controller = connected();

        let actions = controller
            .handle(RoomEvent::Create {
                nickname: "ada".to_string(),
                user_icon: Some("owl".to_string()),
            })
            .unwrap();
        assert_eq!(controller.phase(), RoomPhase::Joining);

        let epoch = request_create_epoch(&actions);
        let actions = controller
            .handle(RoomEvent::CreateOutcome { epoch, outcome: Ok("room-1".to_string()) })
            .unwrap();

        assert_eq!(controller.phase(), RoomPhase::InRoom);
        assert_eq!(controller.session(), Some(&session("room-1")));
        assert_eq!(actions, vec![RoomAction::PersistSession(session("room-1"))]);
    }

    #[test]
    fn create_while_in_room_is_rejected_without_touching_the_session() {
        let mut controller = in_room();
        let before = controller.session().cloned();

        let result =
            controller.handle(RoomEvent::Create { nickname: "eve".to_string(), user_icon: None });

        assert_eq!(result, Err(RoomError::AlreadyInRoom));
        assert_eq!(controller.session().cloned(), before);
        assert_eq!(controller.phase(), RoomPhase::InRoom);
    }

    #[test]
    fn create_rejection_leaves_no_session() {
        let mut controller = connected();
        let actions = controller
            .handle(RoomEvent::Create { nickname: "ada".to_string(), user_icon: None })
            .unwrap();

        let epoch = request_create_epoch(&actions);
        let actions = controller
            .handle(RoomEvent::CreateOutcome { epoch, outcome: Err("room limit".to_string()) })
            .unwrap();

        assert!(actions.is_empty());
        assert_eq!(controller.session(), None);
        assert_eq!(controller.phase(), RoomPhase::NoSession);
    }

    #[test]
    fn join_success_sets_session_and_replaces_log() {
        let mut controller = connected();
        controller.handle(RoomEvent::Envelope(ServerEnvelope::SendMessage(message("stale")))).unwrap();

        let actions = controller
            .handle(RoomEvent::Join {
                room_id: "room-2".to_string(),
                nickname: "ada".to_string(),
                user_icon: None,
            })
            .unwrap();
        let epoch = request_join_epoch(&actions);

        let history = MessageList { messages: vec![message("old-1"), message("old-2")] };
        let actions = controller
            .handle(RoomEvent::JoinOutcome { epoch, outcome: Ok(history) })
            .unwrap();

        assert_eq!(controller.phase(), RoomPhase::InRoom);
        assert_eq!(controller.session().map(|s| s.room_id.as_str()), Some("room-2"));
        assert!(matches!(actions.as_slice(), [RoomAction::PersistSession(_)]));

        let bodies: Vec<_> = controller.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["old-1", "old-2"]);
    }

    #[test]
    fn join_while_disconnected_is_a_no_op() {
        let mut controller = RoomController::new();

        let actions = controller
            .handle(RoomEvent::Join {
                room_id: "room-2".to_string(),
                nickname: "ada".to_string(),
                user_icon: None,
            })
            .unwrap();

        assert!(actions.is_empty());
        assert_eq!(controller.phase(), RoomPhase::NoSession);
    }

    #[test]
    fn join_failure_clears_session_and_preserves_log() {
        let mut controller = connected();
        controller.handle(RoomEvent::Envelope(ServerEnvelope::SendMessage(message("kept")))).unwrap();

        let actions = controller
            .handle(RoomEvent::Join {
                room_id: "room-404".to_string(),
                nickname: "ada".to_string(),
                user_icon: None,
            })
            .unwrap();
        let epoch = request_join_epoch(&actions);

        let actions = controller
            .handle(RoomEvent::JoinOutcome { epoch, outcome: Err("no such room".to_string()) })
            .unwrap();

        assert_eq!(actions, vec![RoomAction::ClearSession]);
        assert_eq!(controller.session(), None);
        assert_eq!(controller.phase(), RoomPhase::NoSession);

        // The log keeps its pre-call contents.
        assert_eq!(controller.messages().len(), 1);
        assert_eq!(controller.messages()[0].body, "kept");
    }

    #[test]
    fn ready_with_stored_session_issues_exactly_one_rejoin() {
        let mut controller = RoomController::resume(session("room-1"));
        assert_eq!(controller.phase(), RoomPhase::Rejoining);

        let actions = controller.handle(RoomEvent::Ready).unwrap();
        match actions.as_slice() {
            [RoomAction::RequestJoin { room_id, nickname, user_icon, .. }] => {
                assert_eq!(room_id, "room-1");
                assert_eq!(nickname, "ada");
                assert_eq!(user_icon.as_deref(), Some("owl"));
            },
            other => panic!("expected a single RequestJoin, got {other:?}"),
        }
    }

    #[test]
    fn rejoin_does_not_overwrite_the_stored_identity() {
        let mut controller = RoomController::resume(session("room-1"));

        let actions = controller.handle(RoomEvent::Ready).unwrap();
        let epoch = request_join_epoch(&actions);

        let actions = controller
            .handle(RoomEvent::JoinOutcome {
                epoch,
                outcome: Ok(MessageList { messages: vec![message("history")] }),
            })
            .unwrap();

        // Session was already on record: nothing to persist again.
        assert!(actions.is_empty());
        assert_eq!(controller.session(), Some(&session("room-1")));
        assert_eq!(controller.phase(), RoomPhase::InRoom);
        assert_eq!(controller.messages().len(), 1);
    }

    #[test]
    fn each_reconnect_rejoins_once_and_replaces_the_log() {
        let mut controller = RoomController::resume(session("room-1"));

        // First connect.
        let epoch = request_join_epoch(&controller.handle(RoomEvent::Ready).unwrap());
        controller
            .handle(RoomEvent::JoinOutcome {
                epoch,
                outcome: Ok(MessageList { messages: vec![message("first")] }),
            })
            .unwrap();

        // Messages buffered before the drop.
        controller
            .handle(RoomEvent::Envelope(ServerEnvelope::SendMessage(message("buffered"))))
            .unwrap();
        assert_eq!(controller.messages().len(), 2);

        // Drop and reconnect.
        assert!(controller.handle(RoomEvent::Closed).unwrap().is_empty());
        let actions = controller.handle(RoomEvent::Ready).unwrap();
        let epoch = request_join_epoch(&actions);
        assert_eq!(controller.phase(), RoomPhase::Rejoining);

        controller
            .handle(RoomEvent::JoinOutcome {
                epoch,
                outcome: Ok(MessageList { messages: vec![message("authoritative")] }),
            })
            .unwrap();

        // Replaced, not appended.
        let bodies: Vec<_> = controller.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["authoritative"]);
    }

    #[test]
    fn leave_clears_everything_and_tears_down() {
        let mut controller = in_room();
        controller.handle(RoomEvent::Envelope(ServerEnvelope::SendMessage(message("a")))).unwrap();
        controller
            .handle(RoomEvent::Envelope(ServerEnvelope::SetTypingPresence { anyone_typing: true }))
            .unwrap();

        let actions = controller.handle(RoomEvent::Leave).unwrap();

        assert_eq!(actions, vec![RoomAction::Teardown, RoomAction::ClearSession]);
        assert_eq!(controller.session(), None);
        assert!(controller.messages().is_empty());
        assert!(!controller.anyone_typing());
        assert_eq!(controller.phase(), RoomPhase::NoSession);
    }

    #[test]
    fn stale_join_outcome_after_leave_is_discarded() {
        let mut controller = connected();
        let actions = controller
            .handle(RoomEvent::Join {
                room_id: "room-2".to_string(),
                nickname: "ada".to_string(),
                user_icon: None,
            })
            .unwrap();
        let epoch = request_join_epoch(&actions);

        // Leave while the join is still in flight.
        controller.handle(RoomEvent::Leave).unwrap();

        // The response arrives late; it must not resurrect the session.
        let actions = controller
            .handle(RoomEvent::JoinOutcome {
                epoch,
                outcome: Ok(MessageList { messages: vec![message("ghost")] }),
            })
            .unwrap();

        assert!(actions.is_empty());
        assert_eq!(controller.session(), None);
        assert!(controller.messages().is_empty());
        assert_eq!(controller.phase(), RoomPhase::NoSession);
    }

    #[test]
    fn inbound_messages_append_in_arrival_order() {
        let mut controller = in_room();
        for body in ["a", "b", "c"] {
            controller
                .handle(RoomEvent::Envelope(ServerEnvelope::SendMessage(message(body))))
                .unwrap();
        }

        let bodies: Vec<_> = controller.messages().iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, ["a", "b", "c"]);
    }

    #[test]
    fn presence_follows_the_latest_envelope() {
        let mut controller = in_room();
        controller
            .handle(RoomEvent::Envelope(ServerEnvelope::SetTypingPresence { anyone_typing: true }))
            .unwrap();
        assert!(controller.anyone_typing());

        controller
            .handle(RoomEvent::Envelope(ServerEnvelope::SetTypingPresence { anyone_typing: false }))
            .unwrap();
        assert!(!controller.anyone_typing());
    }

    #[test]
    fn repeated_typing_transitions_are_all_sent() {
        let mut controller = in_room();

        let first = controller.handle(RoomEvent::SetTyping { typing: true }).unwrap();
        let second = controller.handle(RoomEvent::SetTyping { typing: true }).unwrap();

        let expected =
            vec![RoomAction::SendEnvelope(ClientEnvelope::SetTypingPresence { typing: true })];
        assert_eq!(first, expected);
        assert_eq!(second, expected);
    }

    #[test]
    fn send_and_typing_are_no_ops_without_a_session() {
        let mut controller = connected();

        assert!(controller.handle(RoomEvent::Send { body: "hi".to_string() }).unwrap().is_empty());
        assert!(controller.handle(RoomEvent::SetTyping { typing: true }).unwrap().is_empty());
    }

    #[test]
    fn send_is_dropped_while_disconnected() {
        let mut controller = in_room();
        controller.handle(RoomEvent::Closed).unwrap();

        let actions = controller.handle(RoomEvent::Send { body: "hi".to_string() }).unwrap();
        assert!(actions.is_empty());

        // The session survives the drop: only leave clears it.
        assert!(controller.session().is_some());
    }

    #[test]
    fn send_in_room_emits_the_message_envelope() {
        let mut controller = in_room();

        let actions = controller.handle(RoomEvent::Send { body: "hello".to_string() }).unwrap();
        assert_eq!(
            actions,
            vec![RoomAction::SendEnvelope(ClientEnvelope::SendMessage {
                body: "hello".to_string()
            })]
        );

        // No local echo: the log grows only when the backend delivers it.
        assert!(controller.messages().is_empty());
    }

    #[test]
    fn superseded_request_outcome_is_discarded() {
        let mut controller = connected();

        let first = controller
            .handle(RoomEvent::Join {
                room_id: "room-a".to_string(),
                nickname: "ada".to_string(),
                user_icon: None,
            })
            .unwrap();
        let first_epoch = request_join_epoch(&first);

        let second = controller
            .handle(RoomEvent::Join {
                room_id: "room-b".to_string(),
                nickname: "ada".to_string(),
                user_icon: None,
            })
            .unwrap();
        let second_epoch = request_join_epoch(&second);

        // The superseded outcome is ignored even though it looks successful.
        let actions = controller
            .handle(RoomEvent::JoinOutcome {
                epoch: first_epoch,
                outcome: Ok(MessageList { messages: vec![message("a")] }),
            })
            .unwrap();
        assert!(actions.is_empty());
        assert_eq!(controller.session(), None);

        // The live request still completes normally.
        controller
            .handle(RoomEvent::JoinOutcome {
                epoch: second_epoch,
                outcome: Ok(MessageList { messages: Vec::new() }),
            })
            .unwrap();
        assert_eq!(controller.session().map(|s| s.room_id.as_str()), Some("room-b"));
    }
}
