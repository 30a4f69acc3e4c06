use async_trait::async_trait;
use meshcall_client::media::LocalTrack;
use meshcall_client::peer::{
    PeerConnectionFactory, PeerConnectionState, PeerEvent, PeerEventSink, PeerTransportConnection,
    RemoteTrack,
};
use meshcall_client::{ClientId, NegotiationError, TrackKind};
use meshcall_core::{IceCandidatePayload, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Everything the mesh asked a connection to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerCall {
    AddTrack(TrackKind),
    CreateOffer,
    CreateAnswer,
    SetRemote(SdpKind),
    AddCandidate(String),
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailStep {
    CreateOffer,
    CreateAnswer,
    SetRemote,
    AddCandidate,
}

pub struct MockPeerConnection {
    pub peer_id: ClientId,
    label: String,
    sink: PeerEventSink,
    calls: Mutex<Vec<PeerCall>>,
    fail_on: Option<FailStep>,
    closed: AtomicBool,
}

impl MockPeerConnection {
    pub fn calls(&self) -> Vec<PeerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Reports an event as the native connection would.
    pub fn emit(&self, event: PeerEvent) -> bool {
        self.sink.emit(event)
    }

    pub fn emit_candidate(&self, candidate: &str) -> bool {
        self.emit(PeerEvent::LocalCandidate(candidate_payload(candidate)))
    }

    pub fn emit_track(&self, kind: TrackKind, stream_id: &str) -> bool {
        self.emit(PeerEvent::RemoteTrack(RemoteTrack {
            track_id: format!("{stream_id}-{kind:?}"),
            stream_id: stream_id.to_owned(),
            kind,
            handle: None,
        }))
    }

    pub fn emit_state(&self, state: PeerConnectionState) -> bool {
        self.emit(PeerEvent::StateChanged(state))
    }

    fn record(&self, call: PeerCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, step: FailStep) -> Result<(), NegotiationError> {
        if self.fail_on == Some(step) {
            return Err(NegotiationError::Rtc(format!("injected failure at {step:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl PeerTransportConnection for MockPeerConnection {
    async fn add_track(&self, track: Arc<LocalTrack>) -> Result<(), NegotiationError> {
        self.record(PeerCall::AddTrack(track.kind()));
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription, NegotiationError> {
        self.record(PeerCall::CreateOffer);
        self.check(FailStep::CreateOffer)?;
        Ok(SessionDescription::offer(format!(
            "mock-offer {} -> {}",
            self.label, self.peer_id
        )))
    }

    async fn create_answer(&self) -> Result<SessionDescription, NegotiationError> {
        self.record(PeerCall::CreateAnswer);
        self.check(FailStep::CreateAnswer)?;
        Ok(SessionDescription::answer(format!(
            "mock-answer {} -> {}",
            self.label, self.peer_id
        )))
    }

    async fn set_remote_description(
        &self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError> {
        self.record(PeerCall::SetRemote(description.kind));
        self.check(FailStep::SetRemote)
    }

    async fn add_ice_candidate(
        &self,
        candidate: IceCandidatePayload,
    ) -> Result<(), NegotiationError> {
        self.record(PeerCall::AddCandidate(candidate.candidate));
        self.check(FailStep::AddCandidate)
    }

    async fn close(&self) {
        self.record(PeerCall::Close);
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// Factory keeping every connection it built so tests can inspect and drive
/// them.
#[derive(Clone)]
pub struct MockPeerFactory {
    label: String,
    connections: Arc<Mutex<Vec<Arc<MockPeerConnection>>>>,
    failures: Arc<Mutex<Vec<(ClientId, FailStep)>>>,
    refuse: Arc<Mutex<Vec<ClientId>>>,
    early_candidates: bool,
}

impl MockPeerFactory {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_owned(),
            connections: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(Vec::new())),
            refuse: Arc::new(Mutex::new(Vec::new())),
            early_candidates: false,
        }
    }

    /// Connections report a local candidate as soon as they are created,
    /// before any description exists.
    pub fn with_early_candidates(mut self) -> Self {
        self.early_candidates = true;
        self
    }

    /// The next connection built for `peer` fails at `step`.
    pub fn fail_for(&self, peer: &str, step: FailStep) {
        self.failures
            .lock()
            .unwrap()
            .push((ClientId::from(peer), step));
    }

    /// Creating a connection for `peer` fails outright.
    pub fn refuse(&self, peer: &str) {
        self.refuse.lock().unwrap().push(ClientId::from(peer));
    }

    pub fn connections(&self) -> Vec<Arc<MockPeerConnection>> {
        self.connections.lock().unwrap().clone()
    }

    pub fn connections_for(&self, peer: &str) -> Vec<Arc<MockPeerConnection>> {
        let peer = ClientId::from(peer);
        self.connections()
            .into_iter()
            .filter(|c| c.peer_id == peer)
            .collect()
    }

    /// Most recent connection built for `peer`.
    pub fn connection(&self, peer: &str) -> Option<Arc<MockPeerConnection>> {
        self.connections_for(peer).pop()
    }
}

#[async_trait]
impl PeerConnectionFactory for MockPeerFactory {
    async fn create(
        &self,
        sink: PeerEventSink,
    ) -> Result<Arc<dyn PeerTransportConnection>, NegotiationError> {
        let peer_id = sink.peer_id().clone();
        if self.refuse.lock().unwrap().contains(&peer_id) {
            return Err(NegotiationError::Rtc(format!("refused connection to {peer_id}")));
        }

        let fail_on = {
            let mut failures = self.failures.lock().unwrap();
            failures
                .iter()
                .position(|(id, _)| *id == peer_id)
                .map(|i| failures.remove(i).1)
        };

        let connection = Arc::new(MockPeerConnection {
            peer_id,
            label: self.label.clone(),
            sink,
            calls: Mutex::new(Vec::new()),
            fail_on,
            closed: AtomicBool::new(false),
        });
        if self.early_candidates {
            connection.emit_candidate("candidate:early 1 udp 1 127.0.0.1 9 typ host");
        }

        self.connections.lock().unwrap().push(connection.clone());
        Ok(connection)
    }
}

pub fn candidate_payload(candidate: &str) -> IceCandidatePayload {
    IceCandidatePayload {
        candidate: candidate.to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}
