use crate::chat::ChatRelay;
use crate::error::{SessionError, TransportError};
use crate::media::MediaController;
use crate::mesh::{MeshAction, PeerConnectionMesh};
use crate::peer::PeerSignal;
use crate::session::session_command::SessionCommand;
use crate::session::{SessionEvent, SessionState};
use crate::transport::{SignalingTransport, TransportEvent, TransportEvents};
use meshcall_core::{ClientId, RoomId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

/// Owns every component of one membership and reacts to transport messages,
/// peer reports and handle commands one at a time.
pub(crate) struct SessionActor {
    pub(super) room: RoomId,
    pub(super) client_id: ClientId,
    pub(super) transport: Arc<dyn SignalingTransport>,
    pub(super) transport_rx: TransportEvents,
    pub(super) command_rx: mpsc::Receiver<SessionCommand>,
    pub(super) peer_rx: mpsc::UnboundedReceiver<PeerSignal>,
    pub(super) mesh: PeerConnectionMesh,
    pub(super) media: MediaController,
    pub(super) chat: ChatRelay,
    pub(super) events: broadcast::Sender<SessionEvent>,
    pub(super) state: watch::Sender<SessionState>,
}

impl SessionActor {
    pub(crate) async fn run(mut self) {
        info!("Session loop started for {} in room {}", self.client_id, self.room);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => {
                            if !self.handle_command(c).await {
                                break;
                            }
                        }
                        None => {
                            info!("Session handle dropped. Tearing down.");
                            self.shutdown().await;
                            self.emit(SessionEvent::Disconnected { reason: None });
                            break;
                        }
                    }
                }

                evt = self.transport_rx.recv() => {
                    let keep_running = match evt {
                        Some(e) => self.handle_transport_event(e).await,
                        None => {
                            self.fail(TransportError::Socket("event stream ended".into()))
                                .await;
                            false
                        }
                    };
                    if !keep_running {
                        break;
                    }
                }

                Some(signal) = self.peer_rx.recv() => {
                    let actions = self.mesh.on_peer_signal(signal).await;
                    self.apply(actions);
                }
            }
        }

        info!("Session loop finished for {}", self.client_id);
    }

    /// Returns false when the session has to end.
    async fn handle_transport_event(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Connected => {
                let activated = self.state.send_if_modified(|s| {
                    if *s == SessionState::Connecting {
                        *s = SessionState::Active;
                        true
                    } else {
                        false
                    }
                });
                if activated {
                    info!("Joined room {} as {}", self.room, self.client_id);
                    self.emit(SessionEvent::Connected {
                        client_id: self.client_id.clone(),
                    });
                }
                true
            }

            TransportEvent::Message(message) => {
                self.handle_signal(message).await;
                true
            }

            TransportEvent::Disconnected { reason } => {
                warn!("Signaling connection lost: {:?}", reason);
                self.shutdown().await;
                self.emit(SessionEvent::Disconnected { reason });
                false
            }

            TransportEvent::Error(e) => {
                self.fail(e).await;
                false
            }
        }
    }

    async fn fail(&mut self, e: TransportError) {
        error!("Signaling transport failed: {}", e);
        let reason = e.to_string();
        self.emit(SessionEvent::Error(SessionError::Transport(e)));
        self.shutdown().await;
        self.emit(SessionEvent::Disconnected {
            reason: Some(reason),
        });
    }

    pub(super) fn apply(&mut self, actions: Vec<MeshAction>) {
        for action in actions {
            match action {
                MeshAction::Send(message) => {
                    self.transport.send(message);
                }
                MeshAction::PeerJoined(peer_id) => {
                    self.emit(SessionEvent::UserJoined { peer_id });
                }
                MeshAction::PeerLeft(peer_id) => {
                    self.emit(SessionEvent::UserLeft { peer_id });
                }
                MeshAction::Track { peer_id, stream } => {
                    self.emit(SessionEvent::Track { peer_id, stream });
                }
                MeshAction::Error(e) => {
                    warn!("{}", e);
                    self.emit(SessionEvent::Error(e));
                }
            }
        }
    }

    pub(super) fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("No session event subscribers");
        }
    }

    /// Leaving: connections, then media, then the transport.
    pub(super) async fn shutdown(&mut self) {
        self.state.send_replace(SessionState::Leaving);

        self.mesh.close_all().await;
        self.media.release();
        self.transport.close().await;

        self.state.send_replace(SessionState::Closed);
        info!("Session for {} in room {} closed", self.client_id, self.room);
    }
}
