use crate::error::TransportError;
use crate::transport::{
    SignalingConnector, SignalingTransport, TransportEvent, TransportEvents, TransportState,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientId, RoomId, SignalMessage, SignalingEndpoint};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

const CLOSE_GRACE: Duration = Duration::from_secs(2);
const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Opens WebSocket connections to `{endpoint}/{ws-path}/{room}/{client}`.
#[derive(Debug, Clone)]
pub struct WsConnector {
    endpoint: SignalingEndpoint,
    event_capacity: usize,
}

impl WsConnector {
    pub fn new(endpoint: SignalingEndpoint) -> Self {
        Self {
            endpoint,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

#[async_trait]
impl SignalingConnector for WsConnector {
    async fn connect(
        &self,
        room: &RoomId,
        client_id: &ClientId,
    ) -> Result<(Arc<dyn SignalingTransport>, TransportEvents), TransportError> {
        let url = self
            .endpoint
            .url_for(room, client_id)
            .map_err(|e| TransportError::Address(e.to_string()))?;

        let (event_tx, event_rx) = mpsc::channel(self.event_capacity);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(TransportState::Connecting);
        let state = Arc::new(state_tx);

        debug!("Connecting signaling transport to {}", url);
        let task = tokio::spawn(run_socket(
            url.to_string(),
            state.clone(),
            outbound_rx,
            event_tx,
        ));

        let transport = WsTransport {
            state,
            outbound: outbound_tx,
            task: Mutex::new(Some(task)),
        };
        Ok((Arc::new(transport), event_rx))
    }
}

pub struct WsTransport {
    state: Arc<watch::Sender<TransportState>>,
    outbound: mpsc::UnboundedSender<String>,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl SignalingTransport for WsTransport {
    fn state(&self) -> TransportState {
        *self.state.borrow()
    }

    fn send(&self, message: SignalMessage) -> bool {
        let state = self.state();
        if state != TransportState::Open {
            warn!(
                "Dropping outbound {:?} message: transport is {:?}",
                message.kind(),
                state
            );
            return false;
        }

        match message.encode() {
            Ok(text) => self.outbound.send(text).is_ok(),
            Err(e) => {
                warn!("Failed to encode signal message: {}", e);
                false
            }
        }
    }

    async fn close(&self) {
        self.state.send_replace(TransportState::Closed);

        let Some(mut task) = self.task.lock().await.take() else {
            return;
        };
        if tokio::time::timeout(CLOSE_GRACE, &mut task).await.is_err() {
            warn!("Signaling socket did not close in time, aborting it");
            task.abort();
        }
    }
}

async fn run_socket(
    url: String,
    state: Arc<watch::Sender<TransportState>>,
    mut outbound: mpsc::UnboundedReceiver<String>,
    events: mpsc::Sender<TransportEvent>,
) {
    let mut closed = state.subscribe();

    let connected = tokio::select! {
        res = connect_async(url.as_str()) => res,
        _ = closed.wait_for(|s| *s == TransportState::Closed) => {
            debug!("Signaling transport closed before the connection was established");
            return;
        }
    };

    let ws_stream = match connected {
        Ok((stream, _response)) => stream,
        Err(e) => {
            warn!("Signaling connection to {} failed: {}", url, e);
            state.send_replace(TransportState::Closed);
            let _ = events
                .send(TransportEvent::Error(TransportError::Connect {
                    url,
                    reason: e.to_string(),
                }))
                .await;
            return;
        }
    };

    let opened = state.send_if_modified(|s| {
        if *s == TransportState::Connecting {
            *s = TransportState::Open;
            true
        } else {
            false
        }
    });
    if !opened {
        return;
    }

    info!("Signaling transport connected: {}", url);
    let _ = events.send(TransportEvent::Connected).await;

    let (mut sink, mut stream) = ws_stream.split();

    let reason = loop {
        tokio::select! {
            biased;

            _ = async { let _ = closed.wait_for(|s| *s == TransportState::Closed).await; } => {
                let _ = sink.send(Message::Close(None)).await;
                let _ = sink.close().await;
                debug!("Signaling transport closed locally: {}", url);
                return;
            }

            out = outbound.recv() => {
                let Some(text) = out else {
                    break None;
                };
                if let Err(e) = sink.send(Message::text(text)).await {
                    let reason = e.to_string();
                    let _ = events
                        .send(TransportEvent::Error(TransportError::Socket(reason.clone())))
                        .await;
                    break Some(reason);
                }
            }

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => deliver(&events, text.as_str()).await,
                Some(Ok(Message::Binary(data))) => match std::str::from_utf8(&data) {
                    Ok(text) => deliver(&events, text).await,
                    Err(_) => warn!("Ignoring non-UTF-8 binary signaling frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    break Some(
                        frame
                            .map(|f| f.reason.as_str().to_owned())
                            .unwrap_or_else(|| "closed by endpoint".to_owned()),
                    );
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let reason = e.to_string();
                    warn!("Signaling socket error: {}", reason);
                    let _ = events
                        .send(TransportEvent::Error(TransportError::Socket(reason.clone())))
                        .await;
                    break Some(reason);
                }
                None => break Some("connection reset".to_owned()),
            },
        }
    };

    let previous = state.send_replace(TransportState::Closed);
    if previous != TransportState::Closed {
        info!("Signaling transport disconnected: {:?}", reason);
        let _ = events.send(TransportEvent::Disconnected { reason }).await;
    }
}

async fn deliver(events: &mpsc::Sender<TransportEvent>, text: &str) {
    match SignalMessage::decode(text) {
        Ok(message) => {
            let _ = events.send(TransportEvent::Message(message)).await;
        }
        Err(e) => warn!("Ignoring malformed signal message: {}", e),
    }
}
