mod rtc_connection;

pub use rtc_connection::{RtcPeerConnection, RtcPeerConnectionFactory};

use crate::error::NegotiationError;
use crate::media::{LocalTrack, TrackKind};
use crate::mesh::NegotiationOutcome;
use async_trait::async_trait;
use meshcall_core::{ClientId, IceCandidatePayload, SessionDescription};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use webrtc::track::track_remote::TrackRemote;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl PeerConnectionState {
    /// States after which the connection is torn down.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed | Self::Closed)
    }
}

#[derive(Clone)]
pub struct RemoteTrack {
    pub track_id: String,
    pub stream_id: String,
    pub kind: TrackKind,
    /// Native handle for reading RTP. Absent for connections without one.
    pub handle: Option<Arc<TrackRemote>>,
}

impl fmt::Debug for RemoteTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTrack")
            .field("track_id", &self.track_id)
            .field("stream_id", &self.stream_id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Media received from one remote participant.
#[derive(Debug, Clone)]
pub struct RemoteStream {
    pub id: String,
    pub tracks: Vec<RemoteTrack>,
}

/// Things a native connection reports on its own.
#[derive(Debug, Clone)]
pub enum PeerEvent {
    LocalCandidate(IceCandidatePayload),
    RemoteTrack(RemoteTrack),
    StateChanged(PeerConnectionState),
}

#[derive(Debug)]
pub(crate) enum PeerSignalBody {
    Connection(PeerEvent),
    Outcome(NegotiationOutcome),
}

/// Anything a peer connection or its negotiation worker reports back to the
/// session, stamped with the entry generation it belongs to.
#[derive(Debug)]
pub(crate) struct PeerSignal {
    pub(crate) peer_id: ClientId,
    pub(crate) generation: u64,
    pub(crate) body: PeerSignalBody,
}

/// Handed to a [`PeerConnectionFactory`] so the connection it builds can
/// report events for exactly one mesh entry.
#[derive(Debug, Clone)]
pub struct PeerEventSink {
    peer_id: ClientId,
    generation: u64,
    tx: mpsc::UnboundedSender<PeerSignal>,
}

impl PeerEventSink {
    pub(crate) fn new(
        peer_id: ClientId,
        generation: u64,
        tx: mpsc::UnboundedSender<PeerSignal>,
    ) -> Self {
        Self {
            peer_id,
            generation,
            tx,
        }
    }

    pub fn peer_id(&self) -> &ClientId {
        &self.peer_id
    }

    /// Returns false once the owning session is gone.
    pub fn emit(&self, event: PeerEvent) -> bool {
        self.forward(PeerSignalBody::Connection(event))
    }

    pub(crate) fn report(&self, outcome: NegotiationOutcome) -> bool {
        self.forward(PeerSignalBody::Outcome(outcome))
    }

    fn forward(&self, body: PeerSignalBody) -> bool {
        self.tx
            .send(PeerSignal {
                peer_id: self.peer_id.clone(),
                generation: self.generation,
                body,
            })
            .is_ok()
    }
}

/// One native peer-to-peer connection.
///
/// `create_offer` and `create_answer` also install the result as the local
/// description.
#[async_trait]
pub trait PeerTransportConnection: Send + Sync {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<(), NegotiationError>;

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError>;

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(
        &self,
        candidate: IceCandidatePayload,
    ) -> Result<(), NegotiationError>;

    async fn close(&self);
}

#[async_trait]
pub trait PeerConnectionFactory: Send + Sync {
    async fn create(
        &self,
        sink: PeerEventSink,
    ) -> Result<Arc<dyn PeerTransportConnection>, NegotiationError>;
}
