use meshcall_core::ClientId;
use thiserror::Error;

/// Failures of the signaling connection itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid signaling address: {0}")]
    Address(String),

    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("signaling socket error: {0}")]
    Socket(String),
}

/// A native connection rejected a negotiation step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    #[error("rtc error: {0}")]
    Rtc(String),

    #[error("unsupported description: {0}")]
    Unsupported(String),
}

impl From<webrtc::Error> for NegotiationError {
    fn from(e: webrtc::Error) -> Self {
        Self::Rtc(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("capture permission denied")]
    PermissionDenied,

    #[error("no capture device available")]
    NoDevice,

    #[error("neither audio nor video was requested")]
    NothingRequested,

    #[error("capture backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by a session, either returned from calls or delivered as
/// [`SessionEvent::Error`](crate::SessionEvent::Error).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("local media unavailable: {0}")]
    CaptureUnavailable(#[from] CaptureError),

    #[error("signaling transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("negotiation with {peer_id} failed: {source}")]
    NegotiationFailure {
        peer_id: ClientId,
        source: NegotiationError,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("chat message rejected: {0}")]
    ChatRejected(String),

    #[error("session is closed")]
    SessionClosed,
}

impl SessionError {
    /// Fatal errors end the whole session; the others are peer-scoped or warnings.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}
