//! Single-task event dispatcher.
//!
//! Every room, registry and signaling mutation goes through one FIFO channel
//! consumed by one task. WebSocket handlers and execution tasks only ever send
//! [`DispatchEvent`]s into it, so events are handled one at a time in arrival
//! order and a broadcast is fully queued before the next event is taken.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};

use crate::{
    domain::{ConnectionId, DisplayName, PusherChannel, RoomId},
    infrastructure::dto::websocket::{ClientEvent, MemberDto, ServerEvent, SignalKind},
    usecase::{
        AttachConnectionUseCase, DisconnectConnectionUseCase, JoinRoomUseCase,
        PropagateEditUseCase, RelaySignalUseCase, RunCodeUseCase, SyncCodeUseCase,
    },
};

/// An event entering the dispatcher.
#[derive(Debug)]
pub enum DispatchEvent {
    /// A WebSocket connection was accepted.
    Attached {
        connection_id: ConnectionId,
        sender: PusherChannel,
    },
    /// A decoded client frame.
    Inbound {
        connection_id: ConnectionId,
        event: ClientEvent,
    },
    /// The connection closed. Sent exactly once per connection.
    Detached { connection_id: ConnectionId },
    /// An execution task finished.
    ExecutionFinished { origin: ConnectionId, output: String },
}

/// Cloneable sending half of the dispatcher channel.
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    tx: UnboundedSender<DispatchEvent>,
}

impl DispatcherHandle {
    pub fn attach(&self, connection_id: ConnectionId, sender: PusherChannel) {
        self.send(DispatchEvent::Attached {
            connection_id,
            sender,
        });
    }

    pub fn dispatch(&self, connection_id: ConnectionId, event: ClientEvent) {
        self.send(DispatchEvent::Inbound {
            connection_id,
            event,
        });
    }

    pub fn detach(&self, connection_id: ConnectionId) {
        self.send(DispatchEvent::Detached { connection_id });
    }

    fn send(&self, event: DispatchEvent) {
        if self.tx.send(event).is_err() {
            tracing::warn!("Dispatcher is not running; event dropped");
        }
    }
}

/// UseCases driven by the dispatcher.
pub struct UseCases {
    pub attach_connection: AttachConnectionUseCase,
    pub join_room: JoinRoomUseCase,
    pub propagate_edit: PropagateEditUseCase,
    pub sync_code: SyncCodeUseCase,
    pub relay_signal: RelaySignalUseCase,
    pub disconnect_connection: DisconnectConnectionUseCase,
    /// Shared with the spawned execution tasks.
    pub run_code: Arc<RunCodeUseCase>,
}

pub struct Dispatcher {
    usecases: UseCases,
    rx: UnboundedReceiver<DispatchEvent>,
    /// Weak so the loop ends once every handle and execution task is gone.
    loopback: WeakUnboundedSender<DispatchEvent>,
}

impl Dispatcher {
    pub fn new(usecases: UseCases) -> (Self, DispatcherHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Self {
            usecases,
            rx,
            loopback: tx.downgrade(),
        };
        (dispatcher, DispatcherHandle { tx })
    }

    /// Process events until every sender has been dropped.
    pub async fn run(mut self) {
        tracing::debug!("Dispatcher started");
        while let Some(event) = self.rx.recv().await {
            self.handle(event).await;
        }
        tracing::debug!("Dispatcher stopped");
    }

    async fn handle(&self, event: DispatchEvent) {
        match event {
            DispatchEvent::Attached {
                connection_id,
                sender,
            } => self.on_attached(connection_id, sender).await,
            DispatchEvent::Inbound {
                connection_id,
                event,
            } => self.on_inbound(connection_id, event).await,
            DispatchEvent::Detached { connection_id } => self.on_detached(connection_id).await,
            DispatchEvent::ExecutionFinished { origin, output } => {
                self.on_execution_finished(origin, output).await
            }
        }
    }

    async fn on_attached(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let Some(greeting) = encode(&ServerEvent::Connected {
            connection_id: connection_id.to_string(),
        }) else {
            return;
        };
        match self
            .usecases
            .attach_connection
            .execute(connection_id.clone(), sender, &greeting)
            .await
        {
            Ok(()) => tracing::info!("Connection '{}' attached", connection_id),
            Err(e) => tracing::warn!("Failed to greet connection '{}': {}", connection_id, e),
        }
    }

    async fn on_inbound(&self, connection_id: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join {
                room_id,
                display_name,
            } => self.on_join(connection_id, room_id, display_name).await,
            ClientEvent::CodeChange { room_id, content } => {
                self.on_code_change(connection_id, room_id, content).await
            }
            ClientEvent::SyncRequest {
                target_connection_id,
                content,
            } => {
                self.on_sync_code(connection_id, target_connection_id, content)
                    .await
            }
            ClientEvent::RunCode { content, language } => {
                self.spawn_execution(connection_id, content, language)
            }
            ClientEvent::VoiceOffer {
                payload,
                target_connection_id,
            } => {
                self.on_signal(SignalKind::Offer, connection_id, target_connection_id, payload)
                    .await
            }
            ClientEvent::VoiceAnswer {
                payload,
                target_connection_id,
            } => {
                self.on_signal(SignalKind::Answer, connection_id, target_connection_id, payload)
                    .await
            }
            ClientEvent::VoiceIce {
                payload,
                target_connection_id,
            } => {
                self.on_signal(
                    SignalKind::IceCandidate,
                    connection_id,
                    target_connection_id,
                    payload,
                )
                .await
            }
        }
    }

    async fn on_join(&self, connection_id: ConnectionId, room_id: String, display_name: String) {
        let room_id = match RoomId::new(room_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Dropped join from '{}': {}", connection_id, e);
                return;
            }
        };

        let members = self
            .usecases
            .join_room
            .execute(
                &connection_id,
                &room_id,
                DisplayName::new(display_name.clone()),
            )
            .await;
        tracing::info!(
            "Connection '{}' joined room '{}' as '{}' ({} member(s))",
            connection_id,
            room_id,
            display_name,
            members.len()
        );

        let Some(message) = encode(&ServerEvent::Joined {
            members: members.iter().cloned().map(MemberDto::from).collect(),
            new_display_name: display_name,
            new_connection_id: connection_id.to_string(),
        }) else {
            return;
        };
        if let Err(e) = self
            .usecases
            .join_room
            .broadcast_joined(&members, &message)
            .await
        {
            tracing::warn!("Failed to broadcast joined for '{}': {}", connection_id, e);
        }
    }

    async fn on_code_change(&self, connection_id: ConnectionId, room_id: String, content: String) {
        let room_id = match RoomId::new(room_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Dropped code-change from '{}': {}", connection_id, e);
                return;
            }
        };
        let Some(message) = encode(&ServerEvent::CodeChange { content }) else {
            return;
        };
        match self
            .usecases
            .propagate_edit
            .execute(&connection_id, &room_id, &message)
            .await
        {
            Ok(targets) => tracing::debug!(
                "Propagated edit from '{}' in room '{}' to {} member(s)",
                connection_id,
                room_id,
                targets.len()
            ),
            Err(e) => tracing::debug!("Dropped code-change: {}", e),
        }
    }

    async fn on_sync_code(&self, connection_id: ConnectionId, target: String, content: String) {
        let target = match ConnectionId::new(target) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Dropped sync-request from '{}': {}", connection_id, e);
                return;
            }
        };
        let Some(message) = encode(&ServerEvent::CodeChange { content }) else {
            return;
        };
        match self.usecases.sync_code.execute(&target, &message).await {
            Ok(()) => tracing::debug!("Synced code from '{}' to '{}'", connection_id, target),
            Err(e) => tracing::debug!("Dropped sync-request: {}", e),
        }
    }

    async fn on_signal(
        &self,
        kind: SignalKind,
        connection_id: ConnectionId,
        target: String,
        payload: serde_json::Value,
    ) {
        let target = match ConnectionId::new(target) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!("Dropped {:?} from '{}': {}", kind, connection_id, e);
                return;
            }
        };
        let Some(message) = encode(&kind.relayed(payload, connection_id.to_string())) else {
            return;
        };
        if let Err(e) = self.usecases.relay_signal.execute(&target, &message).await {
            tracing::debug!("Dropped {:?} from '{}': {}", kind, connection_id, e);
        }
    }

    /// Runs the job off the dispatcher task and posts the result back.
    fn spawn_execution(&self, origin: ConnectionId, content: String, language: String) {
        let Some(loopback) = self.loopback.upgrade() else {
            return;
        };
        let run_code = Arc::clone(&self.usecases.run_code);
        tokio::spawn(async move {
            let output = run_code.execute(origin.clone(), content, &language).await;
            if loopback
                .send(DispatchEvent::ExecutionFinished { origin, output })
                .is_err()
            {
                tracing::warn!("Dispatcher stopped before execution output could be delivered");
            }
        });
    }

    async fn on_execution_finished(&self, origin: ConnectionId, output: String) {
        let Some(message) = encode(&ServerEvent::CodeOutput { output }) else {
            return;
        };
        match self
            .usecases
            .run_code
            .deliver_output(&origin, &message)
            .await
        {
            Ok(()) => tracing::debug!("Delivered code-output to '{}'", origin),
            Err(e) => tracing::debug!("Dropped code-output: {}", e),
        }
    }

    async fn on_detached(&self, connection_id: ConnectionId) {
        let departures = self
            .usecases
            .disconnect_connection
            .execute(&connection_id)
            .await;
        tracing::info!("Connection '{}' detached", connection_id);

        for departure in departures {
            if departure.notify_targets.is_empty() {
                continue;
            }
            let Some(message) = encode(&ServerEvent::Left {
                connection_id: departure.connection_id.to_string(),
                display_name: departure
                    .display_name
                    .as_ref()
                    .map(|name| name.as_str().to_string()),
            }) else {
                continue;
            };
            if let Err(e) = self
                .usecases
                .disconnect_connection
                .broadcast_left(&departure, &message)
                .await
            {
                tracing::warn!(
                    "Failed to broadcast left for room '{}': {}",
                    departure.room_id,
                    e
                );
            }
        }
    }
}

fn encode(event: &ServerEvent) -> Option<String> {
    match event.to_json() {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::warn!("Failed to serialize server event: {}", e);
            None
        }
    }
}
