use crate::chat::ChatMessage;
use crate::error::SessionError;
use crate::media::LocalMediaState;
use crate::mesh::PeerSummary;
use crate::session::session_command::SessionCommand;
use crate::session::{SessionEvent, SessionEvents, SessionSnapshot, SessionState};
use meshcall_core::{ClientId, RoomId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Caller-owned handle to one room membership.
///
/// Dropping it without [`leave`](Session::leave) still tears the session down
/// in the background.
#[derive(Debug)]
pub struct Session {
    room: RoomId,
    client_id: ClientId,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
    state: watch::Receiver<SessionState>,
    actor: Option<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn new(
        room: RoomId,
        client_id: ClientId,
        commands: mpsc::Sender<SessionCommand>,
        events: broadcast::Sender<SessionEvent>,
        state: watch::Receiver<SessionState>,
        actor: JoinHandle<()>,
    ) -> Self {
        Self {
            room,
            client_id,
            commands,
            events,
            state,
            actor: Some(actor),
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Resolves once the session reaches `target`, or immediately if the
    /// session closed first.
    pub async fn wait_for_state(&self, target: SessionState) -> SessionState {
        let mut state = self.state.clone();
        match state
            .wait_for(|s| *s == target || *s == SessionState::Closed)
            .await
        {
            Ok(s) => *s,
            Err(_) => SessionState::Closed,
        }
    }

    /// New receiver for events emitted from now on.
    pub fn subscribe(&self) -> SessionEvents {
        self.events.subscribe()
    }

    /// Broadcasts `content` to the room and returns the local echo.
    pub async fn send_chat(&self, content: impl Into<String>) -> Result<ChatMessage, SessionError> {
        let content = content.into();
        self.request(|reply| SessionCommand::SendChat { content, reply })
            .await?
    }

    pub async fn set_audio_enabled(&self, enabled: bool) -> Result<LocalMediaState, SessionError> {
        self.request(|reply| SessionCommand::SetAudioEnabled { enabled, reply })
            .await
    }

    pub async fn set_video_enabled(&self, enabled: bool) -> Result<LocalMediaState, SessionError> {
        self.request(|reply| SessionCommand::SetVideoEnabled { enabled, reply })
            .await
    }

    /// Full view including the retained chat history.
    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// Current mesh entries, sorted by peer id.
    pub async fn peers(&self) -> Result<Vec<PeerSummary>, SessionError> {
        self.request(|reply| SessionCommand::Peers { reply }).await
    }

    pub async fn local_media(&self) -> Result<LocalMediaState, SessionError> {
        self.request(|reply| SessionCommand::LocalMedia { reply }).await
    }

    /// Closes every peer connection, releases media and closes the transport.
    /// Returns after all of it is done. Calling it again is a no-op.
    pub async fn leave(&mut self) -> Result<(), SessionError> {
        let Some(actor) = self.actor.take() else {
            return Ok(());
        };

        info!("Leaving room {} as {}", self.room, self.client_id);
        let (reply, done) = oneshot::channel();
        if self.commands.send(SessionCommand::Leave { reply }).await.is_ok() {
            let _ = done.await;
        }
        if let Err(e) = actor.await {
            warn!("Session task for {} ended abnormally: {}", self.room, e);
        }
        Ok(())
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::SessionClosed)?;
        response.await.map_err(|_| SessionError::SessionClosed)
    }
}
