mod chat;
mod config;
mod error;
mod mesh;
mod session;

pub mod media;
pub mod peer;
pub mod transport;

pub use chat::{CHAT_HISTORY_LIMIT, ChatMessage, ChatSender};
pub use config::{ClientConfig, DEFAULT_EVENT_CAPACITY, DEFAULT_SIGNALING_URL};
pub use error::{CaptureError, NegotiationError, SessionError, TransportError};
pub use media::{LocalMediaState, MediaConstraints, TrackKind};
pub use mesh::{NegotiationState, PeerEntry, PeerSummary};
pub use session::{CallClient, Session, SessionEvent, SessionEvents, SessionSnapshot, SessionState};

pub use meshcall_core::{ClientId, RoomId, SignalMessage, SignalingEndpoint};
