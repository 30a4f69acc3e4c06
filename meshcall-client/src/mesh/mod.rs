mod negotiation;

pub(crate) use negotiation::NegotiationOutcome;

use crate::error::{NegotiationError, SessionError};
use crate::media::LocalTrack;
use crate::mesh::negotiation::{NegotiationCommand, spawn_worker};
use crate::peer::{
    PeerConnectionFactory, PeerEvent, PeerEventSink, PeerSignal, PeerSignalBody,
    PeerTransportConnection, RemoteStream, RemoteTrack,
};
use futures::future::join_all;
use meshcall_core::{ClientId, IceCandidatePayload, SessionDescription, SignalMessage};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    New,
    HaveLocalOffer,
    HaveRemoteOffer,
    Stable,
    Failed,
}

/// Mesh bookkeeping for one remote participant.
pub struct PeerEntry {
    peer_id: ClientId,
    generation: u64,
    connection: Arc<dyn PeerTransportConnection>,
    remote_stream: Option<RemoteStream>,
    negotiation: NegotiationState,
    /// Local candidates gathered before our description went out.
    pending_candidates: Vec<IceCandidatePayload>,
    description_sent: bool,
    commands: mpsc::UnboundedSender<NegotiationCommand>,
    worker: JoinHandle<()>,
}

impl PeerEntry {
    pub fn peer_id(&self) -> &ClientId {
        &self.peer_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn negotiation(&self) -> NegotiationState {
        self.negotiation
    }

    pub fn remote_stream(&self) -> Option<&RemoteStream> {
        self.remote_stream.as_ref()
    }

    fn enqueue(&self, command: NegotiationCommand) {
        if self.commands.send(command).is_err() {
            debug!("Negotiation worker for {} already stopped", self.peer_id);
        }
    }

    fn attach_remote_track(&mut self, track: RemoteTrack) -> RemoteStream {
        match &mut self.remote_stream {
            Some(stream) if stream.id == track.stream_id => {
                if !stream.tracks.iter().any(|t| t.track_id == track.track_id) {
                    stream.tracks.push(track);
                }
                stream.clone()
            }
            _ => {
                let stream = RemoteStream {
                    id: track.stream_id.clone(),
                    tracks: vec![track],
                };
                self.remote_stream = Some(stream.clone());
                stream
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct PeerSummary {
    pub peer_id: ClientId,
    pub negotiation: NegotiationState,
    pub remote_stream: Option<RemoteStream>,
}

/// What the session has to do after the mesh reacted to something.
#[derive(Debug)]
pub(crate) enum MeshAction {
    Send(SignalMessage),
    PeerJoined(ClientId),
    PeerLeft(ClientId),
    Track {
        peer_id: ClientId,
        stream: RemoteStream,
    },
    Error(SessionError),
}

/// One connection per remote participant, never two.
pub(crate) struct PeerConnectionMesh {
    local_id: ClientId,
    factory: Arc<dyn PeerConnectionFactory>,
    local_tracks: Vec<Arc<LocalTrack>>,
    entries: HashMap<ClientId, PeerEntry>,
    next_generation: u64,
    signal_tx: mpsc::UnboundedSender<PeerSignal>,
}

impl PeerConnectionMesh {
    pub(crate) fn new(
        local_id: ClientId,
        factory: Arc<dyn PeerConnectionFactory>,
        signal_tx: mpsc::UnboundedSender<PeerSignal>,
    ) -> Self {
        Self {
            local_id,
            factory,
            local_tracks: Vec::new(),
            entries: HashMap::new(),
            next_generation: 0,
            signal_tx,
        }
    }

    /// Tracks attached to every entry created from now on.
    pub(crate) fn set_local_tracks(&mut self, tracks: Vec<Arc<LocalTrack>>) {
        self.local_tracks = tracks;
    }

    pub(crate) fn summaries(&self) -> Vec<PeerSummary> {
        let mut peers: Vec<PeerSummary> = self
            .entries
            .values()
            .map(|e| PeerSummary {
                peer_id: e.peer_id.clone(),
                negotiation: e.negotiation,
                remote_stream: e.remote_stream.clone(),
            })
            .collect();
        peers.sort_by(|a, b| a.peer_id.cmp(&b.peer_id));
        peers
    }

    /// Initiator path.
    pub(crate) async fn on_user_joined(&mut self, peer_id: ClientId) -> Vec<MeshAction> {
        if peer_id == self.local_id {
            debug!("Ignoring presence for ourselves");
            return Vec::new();
        }
        if self.entries.contains_key(&peer_id) {
            debug!("Peer {} already in mesh, not offering again", peer_id);
            return Vec::new();
        }

        let tracks = self.local_tracks.clone();
        let entry = match self.create_entry(peer_id.clone()).await {
            Ok(entry) => entry,
            Err(e) => return vec![negotiation_failed(peer_id, e)],
        };
        entry.enqueue(NegotiationCommand::AttachTracks(tracks));
        entry.enqueue(NegotiationCommand::CreateOffer);

        vec![MeshAction::PeerJoined(peer_id)]
    }

    /// Responder path. Creates the entry when the offer beats the presence event.
    pub(crate) async fn on_offer(
        &mut self,
        sender: ClientId,
        offer: SessionDescription,
    ) -> Vec<MeshAction> {
        if sender == self.local_id {
            debug!("Ignoring offer from ourselves");
            return Vec::new();
        }

        let mut actions = Vec::new();
        let fresh = !self.entries.contains_key(&sender);
        if fresh {
            match self.create_entry(sender.clone()).await {
                Ok(_) => actions.push(MeshAction::PeerJoined(sender.clone())),
                Err(e) => return vec![negotiation_failed(sender, e)],
            }
        }

        let tracks = self.local_tracks.clone();
        let Some(entry) = self.entries.get_mut(&sender) else {
            return actions;
        };
        entry.description_sent = false;
        entry.enqueue(NegotiationCommand::ApplyRemoteOffer(offer));
        if fresh {
            entry.enqueue(NegotiationCommand::AttachTracks(tracks));
        }
        entry.enqueue(NegotiationCommand::CreateAnswer);

        actions
    }

    pub(crate) fn on_answer(&mut self, sender: &ClientId, answer: SessionDescription) {
        match self.entries.get(sender) {
            Some(entry) => entry.enqueue(NegotiationCommand::ApplyRemoteAnswer(answer)),
            None => debug!("Ignoring answer from {}: no pending negotiation", sender),
        }
    }

    pub(crate) fn on_remote_candidate(&mut self, sender: &ClientId, candidate: IceCandidatePayload) {
        match self.entries.get(sender) {
            Some(entry) => entry.enqueue(NegotiationCommand::AddRemoteCandidate(candidate)),
            None => debug!("Ignoring candidate from unknown peer {}", sender),
        }
    }

    pub(crate) async fn on_user_left(&mut self, peer_id: &ClientId) -> Vec<MeshAction> {
        self.teardown(peer_id).await
    }

    pub(crate) async fn on_peer_signal(&mut self, signal: PeerSignal) -> Vec<MeshAction> {
        let PeerSignal {
            peer_id,
            generation,
            body,
        } = signal;

        let local_id = self.local_id.clone();
        let Some(entry) = self.entries.get_mut(&peer_id) else {
            debug!("Discarding stale signal for removed peer {}", peer_id);
            return Vec::new();
        };
        if entry.generation != generation {
            debug!(
                "Discarding stale signal for {} (generation {} != {})",
                peer_id, generation, entry.generation
            );
            return Vec::new();
        }

        match body {
            PeerSignalBody::Connection(PeerEvent::LocalCandidate(candidate)) => {
                if !entry.description_sent {
                    entry.pending_candidates.push(candidate);
                    return Vec::new();
                }
                vec![MeshAction::Send(SignalMessage::ice_candidate(
                    local_id, peer_id, candidate,
                ))]
            }

            PeerSignalBody::Connection(PeerEvent::RemoteTrack(track)) => {
                let stream = entry.attach_remote_track(track);
                vec![MeshAction::Track { peer_id, stream }]
            }

            PeerSignalBody::Connection(PeerEvent::StateChanged(state)) => {
                if state.is_terminal() {
                    info!("Connection to {} ended ({:?})", peer_id, state);
                    return self.teardown(&peer_id).await;
                }
                Vec::new()
            }

            PeerSignalBody::Outcome(outcome) => match outcome {
                NegotiationOutcome::TracksAttached(count) => {
                    debug!("Attached {} local tracks for {}", count, peer_id);
                    Vec::new()
                }
                NegotiationOutcome::OfferCreated(offer) => {
                    entry.negotiation = NegotiationState::HaveLocalOffer;
                    let message = SignalMessage::Offer {
                        sender: Some(local_id.clone()),
                        target: Some(peer_id.clone()),
                        payload: offer,
                    };
                    Self::description_out(entry, local_id, message)
                }
                NegotiationOutcome::RemoteOfferApplied => {
                    entry.negotiation = NegotiationState::HaveRemoteOffer;
                    Vec::new()
                }
                NegotiationOutcome::AnswerCreated(answer) => {
                    entry.negotiation = NegotiationState::Stable;
                    let message = SignalMessage::Answer {
                        sender: Some(local_id.clone()),
                        target: Some(peer_id.clone()),
                        payload: answer,
                    };
                    Self::description_out(entry, local_id, message)
                }
                NegotiationOutcome::RemoteAnswerApplied => {
                    entry.negotiation = NegotiationState::Stable;
                    info!("Negotiation with {} complete", peer_id);
                    Vec::new()
                }
                NegotiationOutcome::CandidateApplied => Vec::new(),
                NegotiationOutcome::Failed { step, error } => {
                    warn!("Negotiation with {} failed at {}: {}", peer_id, step, error);
                    entry.negotiation = NegotiationState::Failed;
                    let mut actions = vec![negotiation_failed(peer_id.clone(), error)];
                    actions.extend(self.teardown(&peer_id).await);
                    actions
                }
            },
        }
    }

    /// Closes every connection without announcing departures.
    pub(crate) async fn close_all(&mut self) -> usize {
        let entries: Vec<PeerEntry> = self.entries.drain().map(|(_, e)| e).collect();
        let count = entries.len();
        for entry in &entries {
            entry.worker.abort();
        }
        join_all(entries.iter().map(|e| e.connection.close())).await;
        if count > 0 {
            info!("Closed {} peer connections", count);
        }
        count
    }

    async fn create_entry(&mut self, peer_id: ClientId) -> Result<&mut PeerEntry, NegotiationError> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let sink = PeerEventSink::new(peer_id.clone(), generation, self.signal_tx.clone());

        let connection = self.factory.create(sink.clone()).await?;
        let (commands, worker) = spawn_worker(connection.clone(), sink);

        info!("Peer {} added to mesh (generation {})", peer_id, generation);
        let entry = PeerEntry {
            peer_id: peer_id.clone(),
            generation,
            connection,
            remote_stream: None,
            negotiation: NegotiationState::New,
            pending_candidates: Vec::new(),
            description_sent: false,
            commands,
            worker,
        };
        Ok(self.entries.entry(peer_id).or_insert(entry))
    }

    fn description_out(
        entry: &mut PeerEntry,
        local_id: ClientId,
        message: SignalMessage,
    ) -> Vec<MeshAction> {
        entry.description_sent = true;
        let mut actions = vec![MeshAction::Send(message)];
        actions.extend(entry.pending_candidates.drain(..).map(|candidate| {
            MeshAction::Send(SignalMessage::ice_candidate(
                local_id.clone(),
                entry.peer_id.clone(),
                candidate,
            ))
        }));
        actions
    }

    /// Removes the entry and reports the departure. A second call for the same
    /// peer finds nothing and reports nothing.
    async fn teardown(&mut self, peer_id: &ClientId) -> Vec<MeshAction> {
        let Some(entry) = self.entries.remove(peer_id) else {
            return Vec::new();
        };
        entry.worker.abort();
        entry.connection.close().await;
        info!("Peer {} removed from mesh", peer_id);
        vec![MeshAction::PeerLeft(peer_id.clone())]
    }
}

fn negotiation_failed(peer_id: ClientId, source: NegotiationError) -> MeshAction {
    MeshAction::Error(SessionError::NegotiationFailure { peer_id, source })
}
