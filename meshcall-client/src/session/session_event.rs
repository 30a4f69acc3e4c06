use crate::chat::ChatMessage;
use crate::error::SessionError;
use crate::media::LocalMediaState;
use crate::mesh::PeerSummary;
use crate::peer::RemoteStream;
use meshcall_core::ClientId;
use tokio::sync::broadcast;

/// Lifecycle of one membership. A [`Session`](crate::Session) handle only
/// exists from `Connecting` on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Before `join`. Nothing is open and no handle has been handed out.
    #[default]
    Idle,
    Connecting,
    Active,
    Leaving,
    Closed,
}

/// Everything a session reports to the application.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The signaling endpoint accepted us into the room.
    Connected { client_id: ClientId },

    /// A remote participant's media arrived or gained a track.
    Track {
        peer_id: ClientId,
        stream: RemoteStream,
    },

    UserJoined { peer_id: ClientId },

    /// Emitted once per peer entry, whatever removed it.
    UserLeft { peer_id: ClientId },

    Chat(ChatMessage),

    /// Non-fatal unless [`SessionError::is_fatal`] says otherwise.
    Error(SessionError),

    /// Last event of every session.
    Disconnected { reason: Option<String> },
}

pub type SessionEvents = broadcast::Receiver<SessionEvent>;

/// Point-in-time view of a running session.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub peers: Vec<PeerSummary>,
    pub local_media: LocalMediaState,
    pub chat_history: Vec<ChatMessage>,
}
