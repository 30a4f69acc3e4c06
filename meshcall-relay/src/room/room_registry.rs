use axum::extract::ws::Message;
use dashmap::DashMap;
use meshcall_core::{ClientId, MessageKind, RoomId, SignalMessage};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Identifies one socket, so a replaced connection cannot remove its successor.
pub type ConnectionId = u64;

struct Member {
    connection: ConnectionId,
    tx: mpsc::UnboundedSender<Message>,
}

struct RoomsInner {
    rooms: DashMap<RoomId, HashMap<ClientId, Member>>,
    next_connection: AtomicU64,
}

/// Room membership and message routing for every connected client.
#[derive(Clone)]
pub struct RoomRegistry {
    inner: Arc<RoomsInner>,
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RoomsInner {
                rooms: DashMap::new(),
                next_connection: AtomicU64::new(1),
            }),
        }
    }

    /// Registers `client` in `room` and announces it to everyone else there.
    pub fn join(
        &self,
        room: &RoomId,
        client: &ClientId,
        tx: mpsc::UnboundedSender<Message>,
    ) -> ConnectionId {
        let connection = self.inner.next_connection.fetch_add(1, Ordering::Relaxed);

        let mut members = self.inner.rooms.entry(room.clone()).or_default();
        if members
            .insert(client.clone(), Member { connection, tx })
            .is_some()
        {
            info!("Client {} reconnected to room {}, replacing old socket", client, room);
            // The others still hold a connection to the old session.
            let left = SignalMessage::user_left(client.clone());
            for (id, member) in members.iter() {
                if id != client {
                    send_to(id, &member.tx, &left);
                }
            }
        } else {
            info!("Client {} joined room {} ({} members)", client, room, members.len());
        }

        let joined = SignalMessage::user_joined(client.clone());
        for (id, member) in members.iter() {
            if id != client {
                send_to(id, &member.tx, &joined);
            }
        }

        connection
    }

    /// Removes the member if `connection` is still the current one and tells
    /// the rest of the room.
    pub fn leave(&self, room: &RoomId, client: &ClientId, connection: ConnectionId) {
        let Some(mut members) = self.inner.rooms.get_mut(room) else {
            return;
        };
        if members.get(client).map(|m| m.connection) != Some(connection) {
            debug!("Stale disconnect for {} in room {}", client, room);
            return;
        }
        members.remove(client);
        info!("Client {} left room {}", client, room);

        let left = SignalMessage::user_left(client.clone());
        for (id, member) in members.iter() {
            send_to(id, &member.tx, &left);
        }

        let empty = members.is_empty();
        drop(members);
        if empty {
            self.inner.rooms.remove_if(room, |_, m| m.is_empty());
            info!("Room {} closed", room);
        }
    }

    /// Forwards a client message: to its target when it has one, otherwise to
    /// every other member. `sender` is always the connection's own id.
    pub fn route(&self, room: &RoomId, from: &ClientId, message: SignalMessage) {
        if matches!(
            message.kind(),
            MessageKind::UserJoined | MessageKind::UserLeft | MessageKind::Unknown
        ) {
            warn!("Dropping {:?} sent by client {}", message.kind(), from);
            return;
        }

        let message = message.with_sender(from.clone());
        let Some(members) = self.inner.rooms.get(room) else {
            warn!("Message from {} for missing room {}", from, room);
            return;
        };

        match message.target() {
            Some(target) => match members.get(target) {
                Some(member) => send_to(target, &member.tx, &message),
                None => warn!(
                    "Dropping {:?} from {}: {} is not in room {}",
                    message.kind(),
                    from,
                    target,
                    room
                ),
            },
            None => {
                for (id, member) in members.iter() {
                    if id != from {
                        send_to(id, &member.tx, &message);
                    }
                }
            }
        }
    }

    pub fn members(&self, room: &RoomId) -> Vec<ClientId> {
        let mut ids: Vec<ClientId> = self
            .inner
            .rooms
            .get(room)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn room_count(&self) -> usize {
        self.inner.rooms.len()
    }
}

fn send_to(id: &ClientId, tx: &mpsc::UnboundedSender<Message>, message: &SignalMessage) {
    match message.encode() {
        Ok(json) => {
            if tx.send(Message::Text(json.into())).is_err() {
                debug!("Socket of {} already closed", id);
            }
        }
        Err(e) => error!("Failed to serialize signal message: {}", e),
    }
}
