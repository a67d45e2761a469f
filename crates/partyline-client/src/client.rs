//! The public client facade and its dispatch loop.
//!
//! All state lives behind one spawned loop that drains three channels — UI
//! commands, transport events, and room request completions — one event at a
//! time. That serialization is the whole concurrency model: the controller
//! never sees two transitions at once, and completions can never interleave
//! with each other.
//!
//! Create and join requests are performed by short-lived tasks so the loop
//! keeps draining while a request is in flight (a leave issued meanwhile is
//! processed immediately; the late completion is then discarded by the
//! controller's generation guard).

use std::sync::Arc;

use partyline_core::{
    controller::{RoomAction, RoomController, RoomEvent, RoomPhase},
    error::{RoomError, TransportError},
    session::Session,
    storage::SessionStore,
    transport::{Transport, TransportEvent},
};
use partyline_proto::{ChatMessage, MessageList, RoomId};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};

use crate::manager::ConnectionManager;

/// Point-in-time view of the client state, published after every processed
/// event. The UI renders from this and nothing else.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    /// True while the connection can carry traffic.
    pub connected: bool,
    /// Session phase of the controller.
    pub phase: RoomPhase,
    /// The active session, if any.
    pub session: Option<Session>,
    /// Messages of the active room, in arrival order.
    pub messages: Vec<ChatMessage>,
    /// True while anyone else in the room is typing.
    pub anyone_typing: bool,
}

enum Command {
    Create {
        nickname: String,
        user_icon: Option<String>,
        reply: oneshot::Sender<Result<RoomId, RoomError>>,
    },
    Join {
        room_id: RoomId,
        nickname: String,
        user_icon: Option<String>,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        reply: oneshot::Sender<()>,
    },
    Send {
        body: String,
    },
    SetTyping {
        typing: bool,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

enum Completion {
    Create { epoch: u64, outcome: Result<RoomId, TransportError> },
    Join { epoch: u64, outcome: Result<MessageList, TransportError> },
}

enum PendingReply {
    Create(oneshot::Sender<Result<RoomId, RoomError>>),
    Join(oneshot::Sender<Result<(), RoomError>>),
}

struct Parked {
    epoch: u64,
    reply: PendingReply,
}

/// Handle to a running chat client.
///
/// Owns the dispatch loop for its lifetime: dropping the last handle (or
/// calling [`shutdown`](Self::shutdown)) stops the loop and tears the
/// connection down.
pub struct RoomClient {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<RoomSnapshot>,
    task: JoinHandle<()>,
}

impl RoomClient {
    /// Start a client over `transport`, resuming any session persisted in
    /// `store`.
    ///
    /// With a persisted session on record the client starts in
    /// [`RoomPhase::Rejoining`] and re-establishes membership as soon as the
    /// connection reports ready — this is what makes a restart transparent.
    pub fn start(transport: Arc<dyn Transport>, store: SessionStore) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        let controller = match store.load() {
            Some(session) => {
                tracing::debug!(room_id = %session.room_id, "resuming persisted session");
                RoomController::resume(session)
            },
            None => RoomController::new(),
        };
        let (snapshot_tx, snapshots) = watch::channel(snapshot_of(&controller));

        let dispatch = DispatchLoop {
            controller,
            manager: ConnectionManager::new(transport, transport_tx),
            store,
            commands: command_rx,
            transport_events: transport_rx,
            completions: completion_rx,
            completion_tx,
            snapshots: snapshot_tx,
            parked: None,
        };
        let task = tokio::spawn(dispatch.run());

        Self { commands, snapshots, task }
    }

    /// Create a room and join it as `nickname`.
    ///
    /// # Errors
    ///
    /// [`RoomError::AlreadyInRoom`] while a session exists;
    /// [`RoomError::RoomCreate`] when the backend rejects the request.
    pub async fn create_room(
        &self,
        nickname: impl Into<String>,
        user_icon: Option<String>,
    ) -> Result<RoomId, RoomError> {
        let (reply, response) = oneshot::channel();
        let _ = self.commands.send(Command::Create {
            nickname: nickname.into(),
            user_icon,
            reply,
        });
        response.await.unwrap_or_else(|_| {
            Err(RoomError::RoomCreate { reason: "request abandoned".to_string() })
        })
    }

    /// Join an existing room as `nickname`.
    ///
    /// Silently does nothing while disconnected, matching the other outbound
    /// intents.
    ///
    /// # Errors
    ///
    /// [`RoomError::RoomJoin`] when the backend rejects the request.
    pub async fn join_room(
        &self,
        room_id: impl Into<String>,
        nickname: impl Into<String>,
        user_icon: Option<String>,
    ) -> Result<(), RoomError> {
        let (reply, response) = oneshot::channel();
        let _ = self.commands.send(Command::Join {
            room_id: room_id.into(),
            nickname: nickname.into(),
            user_icon,
            reply,
        });
        response.await.unwrap_or_else(|_| {
            Err(RoomError::RoomJoin { reason: "request abandoned".to_string() })
        })
    }

    /// Leave the room: tear the connection down and clear the persisted
    /// session, the message log, and the presence flag.
    pub async fn leave_room(&self) {
        let (reply, response) = oneshot::channel();
        let _ = self.commands.send(Command::Leave { reply });
        let _ = response.await;
    }

    /// Post a message to the active room.
    ///
    /// Fire-and-forget: without a session or a live connection the message
    /// is dropped. There is no local echo — it shows up in the log when the
    /// backend delivers it back.
    pub fn send_message(&self, body: impl Into<String>) {
        let _ = self.commands.send(Command::Send { body: body.into() });
    }

    /// Report a typing transition.
    ///
    /// Edge-triggered by the caller; every reported transition goes out.
    pub fn set_typing(&self, typing: bool) {
        let _ = self.commands.send(Command::SetTyping { typing });
    }

    /// Channel of state snapshots for rendering.
    pub fn snapshots(&self) -> watch::Receiver<RoomSnapshot> {
        self.snapshots.clone()
    }

    /// Stop the dispatch loop and release the connection.
    pub async fn shutdown(self) {
        let (reply, response) = oneshot::channel();
        if self.commands.send(Command::Shutdown { reply }).is_ok() {
            let _ = response.await;
        }
        let _ = self.task.await;
    }
}

fn snapshot_of(controller: &RoomController) -> RoomSnapshot {
    RoomSnapshot {
        connected: controller.is_connected(),
        phase: controller.phase(),
        session: controller.session().cloned(),
        messages: controller.messages().to_vec(),
        anyone_typing: controller.anyone_typing(),
    }
}

fn request_epoch(actions: &[RoomAction]) -> Option<u64> {
    actions.iter().find_map(|action| match action {
        RoomAction::RequestCreate { epoch, .. } | RoomAction::RequestJoin { epoch, .. } => {
            Some(*epoch)
        },
        _ => None,
    })
}

struct DispatchLoop {
    controller: RoomController,
    manager: ConnectionManager,
    store: SessionStore,
    commands: mpsc::UnboundedReceiver<Command>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    completions: mpsc::UnboundedReceiver<Completion>,
    completion_tx: mpsc::UnboundedSender<Completion>,
    snapshots: watch::Sender<RoomSnapshot>,
    parked: Option<Parked>,
}

impl DispatchLoop {
    async fn run(mut self) {
        self.manager.start().await;
        self.publish();

        loop {
            let done = tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    // Every client handle is gone; wind down.
                    None => true,
                },
                Some(event) = self.transport_events.recv() => {
                    self.on_transport(event).await;
                    false
                },
                Some(completion) = self.completions.recv() => {
                    self.on_completion(completion).await;
                    false
                },
            };

            self.publish();
            if done {
                break;
            }
        }

        self.manager.teardown();
        self.publish();
    }

    /// Returns true when the loop should stop.
    async fn on_command(&mut self, command: Command) -> bool {
        match command {
            Command::Create { nickname, user_icon, reply } => {
                match self.controller.handle(RoomEvent::Create { nickname, user_icon }) {
                    Ok(actions) => {
                        if let Some(epoch) = request_epoch(&actions) {
                            self.park(Parked { epoch, reply: PendingReply::Create(reply) });
                        }
                        self.execute(actions).await;
                    },
                    Err(error) => {
                        let _ = reply.send(Err(error));
                    },
                }
            },
            Command::Join { room_id, nickname, user_icon, reply } => {
                match self.controller.handle(RoomEvent::Join { room_id, nickname, user_icon }) {
                    Ok(actions) => {
                        match request_epoch(&actions) {
                            Some(epoch) => {
                                self.park(Parked { epoch, reply: PendingReply::Join(reply) });
                            },
                            // No request went out (disconnected): the intent
                            // was silently dropped, resolve immediately.
                            None => {
                                let _ = reply.send(Ok(()));
                            },
                        }
                        self.execute(actions).await;
                    },
                    Err(error) => {
                        let _ = reply.send(Err(error));
                    },
                }
            },
            Command::Leave { reply } => {
                self.apply(RoomEvent::Leave).await;
                let _ = reply.send(());
            },
            Command::Send { body } => self.apply(RoomEvent::Send { body }).await,
            Command::SetTyping { typing } => self.apply(RoomEvent::SetTyping { typing }).await,
            Command::Shutdown { reply } => {
                let _ = reply.send(());
                return true;
            },
        }
        false
    }

    async fn on_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Ready => {
                self.manager.on_ready();
                self.apply(RoomEvent::Ready).await;
            },
            TransportEvent::Closed => {
                self.manager.on_closed().await;
                self.apply(RoomEvent::Closed).await;
            },
            TransportEvent::Envelope(envelope) => {
                self.apply(RoomEvent::Envelope(envelope)).await;
            },
        }
    }

    async fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Create { epoch, outcome } => {
                let reply = self.take_parked(epoch);
                let (event_outcome, reply_outcome) = match outcome {
                    Ok(room_id) => (Ok(room_id.clone()), Ok(room_id)),
                    Err(error) => {
                        let reason = error.to_string();
                        (Err(reason.clone()), Err(RoomError::RoomCreate { reason }))
                    },
                };

                self.apply(RoomEvent::CreateOutcome { epoch, outcome: event_outcome }).await;

                if let Some(PendingReply::Create(reply)) = reply {
                    let _ = reply.send(reply_outcome);
                }
            },
            Completion::Join { epoch, outcome } => {
                let reply = self.take_parked(epoch);
                let (event_outcome, reply_outcome) = match outcome {
                    Ok(history) => (Ok(history), Ok(())),
                    Err(error) => {
                        let reason = error.to_string();
                        (Err(reason.clone()), Err(RoomError::RoomJoin { reason }))
                    },
                };

                if reply.is_none() {
                    // Nobody is waiting: this was an automatic rejoin.
                    if let Err(reason) = &event_outcome {
                        tracing::warn!(%reason, "automatic rejoin failed");
                    }
                }

                self.apply(RoomEvent::JoinOutcome { epoch, outcome: event_outcome }).await;

                if let Some(PendingReply::Join(reply)) = reply {
                    let _ = reply.send(reply_outcome);
                }
            },
        }
    }

    fn park(&mut self, parked: Parked) {
        // A newer request supersedes the previous one; its abandoned caller
        // observes the dropped channel.
        self.parked = Some(parked);
    }

    fn take_parked(&mut self, epoch: u64) -> Option<PendingReply> {
        if self.parked.as_ref().is_some_and(|parked| parked.epoch == epoch) {
            self.parked.take().map(|parked| parked.reply)
        } else {
            None
        }
    }

    async fn apply(&mut self, event: RoomEvent) {
        match self.controller.handle(event) {
            Ok(actions) => self.execute(actions).await,
            Err(error) => tracing::warn!(%error, "controller rejected event"),
        }
    }

    async fn execute(&mut self, actions: Vec<RoomAction>) {
        for action in actions {
            match action {
                RoomAction::RequestCreate { epoch, nickname, user_icon } => {
                    let handle = self.manager.live_handle();
                    let completions = self.completion_tx.clone();
                    tokio::spawn(async move {
                        let outcome = match handle {
                            Some(handle) => {
                                handle.create_room(&nickname, user_icon.as_deref()).await
                            },
                            None => Err(TransportError::Closed),
                        };
                        let _ = completions.send(Completion::Create { epoch, outcome });
                    });
                },
                RoomAction::RequestJoin { epoch, room_id, nickname, user_icon } => {
                    let handle = self.manager.live_handle();
                    let completions = self.completion_tx.clone();
                    tokio::spawn(async move {
                        let outcome = match handle {
                            Some(handle) => {
                                handle.join_room(&nickname, &room_id, user_icon.as_deref()).await
                            },
                            None => Err(TransportError::Closed),
                        };
                        let _ = completions.send(Completion::Join { epoch, outcome });
                    });
                },
                RoomAction::SendEnvelope(envelope) => self.manager.send(envelope).await,
                RoomAction::PersistSession(session) => {
                    if !self.store.save(&session) {
                        tracing::warn!("session record could not be persisted");
                    }
                },
                RoomAction::ClearSession => self.store.clear(),
                RoomAction::Teardown => self.manager.teardown(),
            }
        }
    }

    fn publish(&self) {
        let _ = self.snapshots.send(snapshot_of(&self.controller));
    }
}
