pub mod e2e_tests;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use meshcall_client::media::LocalMediaSource;
use meshcall_client::{
    CallClient, ChatSender, ClientConfig, ClientId, MediaConstraints, Session, SessionEvent,
    SessionEvents, SignalMessage,
};
use tokio::sync::broadcast::error::RecvError;
use tracing::Level;

use crate::utils::{MockConnector, MockMediaSource, MockPeerFactory, MockRemote};

/// Timeout for a single expected session event (ms).
pub const EVENT_TIMEOUT_MS: u64 = 2000;

const MARKER_SENDER: &str = "marker";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A session joined through [`MockConnector`], with the pieces tests drive.
pub struct TestSession {
    pub session: Session,
    pub events: SessionEvents,
    pub remote: MockRemote,
    pub factory: MockPeerFactory,
    pub media: Arc<MockMediaSource>,
}

pub struct TestSessionBuilder {
    room: String,
    client_id: String,
    factory: MockPeerFactory,
    media: Arc<MockMediaSource>,
    constraints: MediaConstraints,
}

impl TestSessionBuilder {
    pub fn new(room: &str, client_id: &str) -> Self {
        Self {
            room: room.to_owned(),
            client_id: client_id.to_owned(),
            factory: MockPeerFactory::new(client_id),
            media: Arc::new(MockMediaSource::working()),
            constraints: MediaConstraints::default(),
        }
    }

    pub fn factory(mut self, factory: MockPeerFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn media(mut self, media: MockMediaSource) -> Self {
        self.media = Arc::new(media);
        self
    }

    pub fn constraints(mut self, constraints: MediaConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Joins and completes the handshake, consuming the `Connected` event
    /// (and any capture error reported before it).
    pub async fn join(self) -> Result<TestSession> {
        let (connector, mut remotes) = MockConnector::new();
        let config = ClientConfig::default().media(self.constraints);
        let media: Arc<dyn LocalMediaSource> = self.media.clone();
        let client = CallClient::new(
            config,
            Arc::new(connector),
            Arc::new(self.factory.clone()),
            media,
        );

        let (session, mut events) = client
            .join(self.room.as_str(), Some(ClientId::from(self.client_id.as_str())))
            .await
            .context("Failed to join")?;
        let remote = remotes.recv().await.context("No transport was opened")?;
        remote.open().await;

        wait_for_event(&mut events, |e| matches!(e, SessionEvent::Connected { .. })).await?;

        Ok(TestSession {
            session,
            events,
            remote,
            factory: self.factory,
            media: self.media,
        })
    }
}

impl TestSession {
    /// Delivers a marker chat and returns every event emitted before it.
    /// Transport messages are handled in order, so everything delivered
    /// earlier has been processed once this returns.
    pub async fn settle(&mut self) -> Result<Vec<SessionEvent>> {
        self.remote
            .deliver(SignalMessage::chat(ClientId::from(MARKER_SENDER), "__settle__"))
            .await;

        let mut seen = Vec::new();
        loop {
            let event = next_event(&mut self.events).await?;
            if let SessionEvent::Chat(chat) = &event
                && chat.sender == ChatSender::Peer(ClientId::from(MARKER_SENDER))
            {
                return Ok(seen);
            }
            seen.push(event);
        }
    }
}

pub async fn next_event(events: &mut SessionEvents) -> Result<SessionEvent> {
    loop {
        let received = tokio::time::timeout(Duration::from_millis(EVENT_TIMEOUT_MS), events.recv())
            .await
            .context("Timed out waiting for session event")?;
        match received {
            Ok(event) => return Ok(event),
            Err(RecvError::Lagged(n)) => tracing::warn!("Lagged {} events", n),
            Err(RecvError::Closed) => bail!("Session event channel closed"),
        }
    }
}

/// Skips events until one matches.
pub async fn wait_for_event(
    events: &mut SessionEvents,
    predicate: impl Fn(&SessionEvent) -> bool,
) -> Result<SessionEvent> {
    loop {
        let event = next_event(events).await?;
        if predicate(&event) {
            return Ok(event);
        }
    }
}

pub fn is_offer_to(message: &SignalMessage, peer: &str) -> bool {
    matches!(message, SignalMessage::Offer { target: Some(t), .. } if t.as_str() == peer)
}

pub fn is_answer_to(message: &SignalMessage, peer: &str) -> bool {
    matches!(message, SignalMessage::Answer { target: Some(t), .. } if t.as_str() == peer)
}
