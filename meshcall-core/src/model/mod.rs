mod endpoint;
mod ids;
mod signaling;

pub use endpoint::{DEFAULT_WS_PATH, SignalingEndpoint};
pub use ids::{ClientId, RoomId};
pub use signaling::{
    IceCandidatePayload, IceServerConfig, MessageKind, SdpKind, SessionDescription, SignalMessage,
};
