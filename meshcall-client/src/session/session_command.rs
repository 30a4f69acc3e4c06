use crate::chat::ChatMessage;
use crate::error::SessionError;
use crate::media::LocalMediaState;
use crate::mesh::PeerSummary;
use crate::session::SessionSnapshot;
use tokio::sync::oneshot;

/// Requests from the [`Session`](crate::Session) handle to its actor.
#[derive(Debug)]
pub(crate) enum SessionCommand {
    SendChat {
        content: String,
        reply: oneshot::Sender<Result<ChatMessage, SessionError>>,
    },

    SetAudioEnabled {
        enabled: bool,
        reply: oneshot::Sender<LocalMediaState>,
    },

    SetVideoEnabled {
        enabled: bool,
        reply: oneshot::Sender<LocalMediaState>,
    },

    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },

    Peers {
        reply: oneshot::Sender<Vec<PeerSummary>>,
    },

    LocalMedia {
        reply: oneshot::Sender<LocalMediaState>,
    },

    /// Tear everything down; the reply fires once it is done.
    Leave { reply: oneshot::Sender<()> },
}
