use crate::session::SessionEvent;
use crate::session::session_actor::SessionActor;
use meshcall_core::{ClientId, SignalMessage};
use tracing::{debug, warn};

impl SessionActor {
    pub(super) async fn handle_signal(&mut self, message: SignalMessage) {
        let kind = message.kind();
        if !self.addressed_to_us(message.target()) {
            debug!("Ignoring {:?} addressed to someone else", kind);
            return;
        }

        let actions = match message {
            SignalMessage::UserJoined { client_id } => {
                debug!("User {} joined the room", client_id);
                self.mesh.on_user_joined(client_id).await
            }

            SignalMessage::UserLeft { client_id } => {
                debug!("User {} left the room", client_id);
                self.mesh.on_user_left(&client_id).await
            }

            SignalMessage::Offer {
                sender: Some(sender),
                payload,
                ..
            } => self.mesh.on_offer(sender, payload).await,

            SignalMessage::Answer {
                sender: Some(sender),
                payload,
                ..
            } => {
                self.mesh.on_answer(&sender, payload);
                Vec::new()
            }

            SignalMessage::IceCandidate {
                sender: Some(sender),
                payload,
                ..
            } => {
                self.mesh.on_remote_candidate(&sender, payload);
                Vec::new()
            }

            SignalMessage::Offer { sender: None, .. }
            | SignalMessage::Answer { sender: None, .. }
            | SignalMessage::IceCandidate { sender: None, .. } => {
                warn!("Dropping {:?} without sender", kind);
                Vec::new()
            }

            SignalMessage::Chat {
                sender, content, ..
            } => {
                let chat = self.chat.inbound(sender, content);
                self.emit(SessionEvent::Chat(chat));
                Vec::new()
            }

            SignalMessage::Unknown => {
                debug!("Ignoring message of unknown type");
                Vec::new()
            }
        };

        self.apply(actions);
    }

    fn addressed_to_us(&self, target: Option<&ClientId>) -> bool {
        target.is_none_or(|t| *t == self.client_id)
    }
}
