use crate::chat::ChatRelay;
use crate::config::ClientConfig;
use crate::error::{NegotiationError, SessionError};
use crate::media::{LocalMediaSource, MediaController, SampleTrackSource};
use crate::mesh::PeerConnectionMesh;
use crate::peer::{PeerConnectionFactory, RtcPeerConnectionFactory};
use crate::session::session_actor::SessionActor;
use crate::session::{Session, SessionEvent, SessionEvents, SessionState};
use crate::transport::{SignalingConnector, WsConnector};
use meshcall_core::{ClientId, RoomId};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{info, warn};

const COMMAND_CAPACITY: usize = 32;

/// Entry point for joining rooms. One client can run any number of
/// independent sessions.
#[derive(Clone)]
pub struct CallClient {
    config: ClientConfig,
    connector: Arc<dyn SignalingConnector>,
    factory: Arc<dyn PeerConnectionFactory>,
    media: Arc<dyn LocalMediaSource>,
}

impl CallClient {
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn SignalingConnector>,
        factory: Arc<dyn PeerConnectionFactory>,
        media: Arc<dyn LocalMediaSource>,
    ) -> Self {
        Self {
            config,
            connector,
            factory,
            media,
        }
    }

    /// WebSocket signaling, webrtc-rs connections and sample tracks.
    pub fn native(config: ClientConfig) -> Result<Self, NegotiationError> {
        let connector = Arc::new(WsConnector::new(config.endpoint.clone()));
        let factory = Arc::new(RtcPeerConnectionFactory::new(config.ice_servers.clone())?);
        Ok(Self::new(config, connector, factory, Arc::new(SampleTrackSource)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Joins `room`, generating a client id when none is given.
    ///
    /// Media is acquired first so every peer gets the local tracks. A capture
    /// failure is reported as the first event and the session continues
    /// without media. The returned receiver sees every event of the session.
    pub async fn join(
        &self,
        room: impl Into<RoomId>,
        client_id: Option<ClientId>,
    ) -> Result<(Session, SessionEvents), SessionError> {
        let room = room.into();
        let client_id = client_id.unwrap_or_else(ClientId::generate);
        room.validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        client_id
            .validate()
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;

        info!("Joining room {} as {}", room, client_id);
        let (events_tx, events_rx) = broadcast::channel(self.config.event_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(SessionState::Connecting);

        let mut media = MediaController::new(self.media.clone());
        if let Err(e) = media.acquire(self.config.media).await {
            let _ = events_tx.send(SessionEvent::Error(SessionError::CaptureUnavailable(e)));
        }

        let (transport, transport_rx) = match self.connector.connect(&room, &client_id).await {
            Ok(connection) => connection,
            Err(e) => {
                warn!("Could not open signaling for room {}: {}", room, e);
                media.release();
                state_tx.send_replace(SessionState::Closed);
                return Err(e.into());
            }
        };

        let (peer_tx, peer_rx) = mpsc::unbounded_channel();
        let mut mesh = PeerConnectionMesh::new(client_id.clone(), self.factory.clone(), peer_tx);
        mesh.set_local_tracks(media.tracks());

        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let actor = SessionActor {
            room: room.clone(),
            client_id: client_id.clone(),
            transport,
            transport_rx,
            command_rx,
            peer_rx,
            mesh,
            media,
            chat: ChatRelay::new(client_id.clone()),
            events: events_tx.clone(),
            state: state_tx,
        };
        let handle = tokio::spawn(actor.run());

        let session = Session::new(room, client_id, command_tx, events_tx, state_rx, handle);
        Ok((session, events_rx))
    }
}
