mod ws_transport;

pub use ws_transport::{WsConnector, WsTransport};

use crate::error::TransportError;
use async_trait::async_trait;
use meshcall_core::{ClientId, RoomId, SignalMessage};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Connecting,
    Open,
    Closed,
}

/// Events a signaling transport delivers, in arrival order.
#[derive(Debug)]
pub enum TransportEvent {
    /// The endpoint accepted the connection.
    Connected,

    Message(SignalMessage),

    /// The connection dropped after having been open.
    Disconnected { reason: Option<String> },

    /// The endpoint could not be reached or errored mid-session.
    Error(TransportError),
}

/// Duplex connection to one room on the signaling endpoint.
#[async_trait]
pub trait SignalingTransport: Send + Sync {
    fn state(&self) -> TransportState;

    /// Best effort. Messages sent while the transport is not open are dropped
    /// and logged; nothing is queued or retried. Returns whether the message
    /// was handed to the connection.
    fn send(&self, message: SignalMessage) -> bool;

    /// Idempotent. Leaves the transport closed and stops event delivery.
    async fn close(&self);
}

pub type TransportEvents = mpsc::Receiver<TransportEvent>;

#[async_trait]
pub trait SignalingConnector: Send + Sync {
    /// Starts connecting to `room` as `client_id`.
    ///
    /// Only addressing problems fail here. Network failures are reported
    /// later as [`TransportEvent::Error`].
    async fn connect(
        &self,
        room: &RoomId,
        client_id: &ClientId,
    ) -> Result<(Arc<dyn SignalingTransport>, TransportEvents), TransportError>;
}
