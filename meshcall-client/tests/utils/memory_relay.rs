use async_trait::async_trait;
use meshcall_client::transport::{
    SignalingConnector, SignalingTransport, TransportEvent, TransportEvents, TransportState,
};
use meshcall_client::{ClientId, RoomId, SignalMessage, TransportError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

type Members = HashMap<ClientId, mpsc::Sender<TransportEvent>>;

/// In-process signaling endpoint with the relay's routing rules, for running
/// several real sessions against each other.
#[derive(Clone, Default)]
pub struct MemoryRelay {
    rooms: Arc<Mutex<HashMap<RoomId, Members>>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self, room: &str) -> usize {
        self.rooms
            .lock()
            .unwrap()
            .get(&RoomId::from(room))
            .map(|m| m.len())
            .unwrap_or_default()
    }

    fn route(&self, room: &RoomId, from: &ClientId, message: SignalMessage) {
        let message = message.with_sender(from.clone());
        let rooms = self.rooms.lock().unwrap();
        let Some(members) = rooms.get(room) else {
            return;
        };
        match message.target() {
            Some(target) => {
                if let Some(tx) = members.get(target) {
                    let _ = tx.try_send(TransportEvent::Message(message.clone()));
                }
            }
            None => {
                for (id, tx) in members {
                    if id != from {
                        let _ = tx.try_send(TransportEvent::Message(message.clone()));
                    }
                }
            }
        }
    }

    fn leave(&self, room: &RoomId, client: &ClientId) {
        let mut rooms = self.rooms.lock().unwrap();
        let Some(members) = rooms.get_mut(room) else {
            return;
        };
        if members.remove(client).is_none() {
            return;
        }
        for tx in members.values() {
            let _ = tx.try_send(TransportEvent::Message(SignalMessage::user_left(
                client.clone(),
            )));
        }
        if members.is_empty() {
            rooms.remove(room);
        }
    }
}

pub struct MemoryTransport {
    relay: MemoryRelay,
    room: RoomId,
    client_id: ClientId,
    state: Mutex<TransportState>,
}

#[async_trait]
impl SignalingTransport for MemoryTransport {
    fn state(&self) -> TransportState {
        *self.state.lock().unwrap()
    }

    fn send(&self, message: SignalMessage) -> bool {
        if self.state() != TransportState::Open {
            return false;
        }
        self.relay.route(&self.room, &self.client_id, message);
        true
    }

    async fn close(&self) {
        let was_open = {
            let mut state = self.state.lock().unwrap();
            std::mem::replace(&mut *state, TransportState::Closed) == TransportState::Open
        };
        if was_open {
            self.relay.leave(&self.room, &self.client_id);
        }
    }
}

#[async_trait]
impl SignalingConnector for MemoryRelay {
    async fn connect(
        &self,
        room: &RoomId,
        client_id: &ClientId,
    ) -> Result<(Arc<dyn SignalingTransport>, TransportEvents), TransportError> {
        let (tx, rx) = mpsc::channel(256);
        let _ = tx.try_send(TransportEvent::Connected);

        {
            let mut rooms = self.rooms.lock().unwrap();
            let members = rooms.entry(room.clone()).or_default();
            for other in members.values() {
                let _ = other.try_send(TransportEvent::Message(SignalMessage::user_joined(
                    client_id.clone(),
                )));
            }
            members.insert(client_id.clone(), tx);
        }

        let transport = MemoryTransport {
            relay: self.clone(),
            room: room.clone(),
            client_id: client_id.clone(),
            state: Mutex::new(TransportState::Open),
        };
        Ok((Arc::new(transport), rx))
    }
}
