use crate::error::NegotiationError;
use crate::media::LocalTrack;
use crate::peer::{PeerEventSink, PeerTransportConnection};
use meshcall_core::{IceCandidatePayload, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Steps run against one peer connection, strictly in the order queued.
#[derive(Debug)]
pub(crate) enum NegotiationCommand {
    AttachTracks(Vec<Arc<LocalTrack>>),
    CreateOffer,
    ApplyRemoteOffer(SessionDescription),
    CreateAnswer,
    ApplyRemoteAnswer(SessionDescription),
    AddRemoteCandidate(IceCandidatePayload),
}

impl NegotiationCommand {
    fn step(&self) -> &'static str {
        match self {
            Self::AttachTracks(_) => "attach-tracks",
            Self::CreateOffer => "create-offer",
            Self::ApplyRemoteOffer(_) => "apply-offer",
            Self::CreateAnswer => "create-answer",
            Self::ApplyRemoteAnswer(_) => "apply-answer",
            Self::AddRemoteCandidate(_) => "add-candidate",
        }
    }
}

#[derive(Debug)]
pub(crate) enum NegotiationOutcome {
    TracksAttached(usize),
    OfferCreated(SessionDescription),
    RemoteOfferApplied,
    AnswerCreated(SessionDescription),
    RemoteAnswerApplied,
    CandidateApplied,
    Failed {
        step: &'static str,
        error: NegotiationError,
    },
}

pub(crate) fn spawn_worker(
    connection: Arc<dyn PeerTransportConnection>,
    sink: PeerEventSink,
) -> (mpsc::UnboundedSender<NegotiationCommand>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_worker(connection, rx, sink));
    (tx, handle)
}

async fn run_worker(
    connection: Arc<dyn PeerTransportConnection>,
    mut commands: mpsc::UnboundedReceiver<NegotiationCommand>,
    sink: PeerEventSink,
) {
    while let Some(command) = commands.recv().await {
        let step = command.step();
        let result = match command {
            NegotiationCommand::AttachTracks(tracks) => {
                let count = tracks.len();
                let mut res = Ok(NegotiationOutcome::TracksAttached(count));
                for track in tracks {
                    if let Err(e) = connection.add_track(track).await {
                        res = Err(e);
                        break;
                    }
                }
                res
            }
            NegotiationCommand::CreateOffer => connection
                .create_offer()
                .await
                .map(NegotiationOutcome::OfferCreated),
            NegotiationCommand::ApplyRemoteOffer(desc) => connection
                .set_remote_description(desc)
                .await
                .map(|_| NegotiationOutcome::RemoteOfferApplied),
            NegotiationCommand::CreateAnswer => connection
                .create_answer()
                .await
                .map(NegotiationOutcome::AnswerCreated),
            NegotiationCommand::ApplyRemoteAnswer(desc) => connection
                .set_remote_description(desc)
                .await
                .map(|_| NegotiationOutcome::RemoteAnswerApplied),
            NegotiationCommand::AddRemoteCandidate(candidate) => connection
                .add_ice_candidate(candidate)
                .await
                .map(|_| NegotiationOutcome::CandidateApplied),
        };

        match result {
            Ok(outcome) => {
                if !sink.report(outcome) {
                    break;
                }
            }
            Err(error) => {
                sink.report(NegotiationOutcome::Failed { step, error });
                break;
            }
        }
    }
    debug!("Negotiation worker for {} finished", sink.peer_id());
}
