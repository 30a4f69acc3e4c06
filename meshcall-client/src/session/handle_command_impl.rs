use crate::session::session_actor::SessionActor;
use crate::session::session_command::SessionCommand;
use crate::session::{SessionEvent, SessionSnapshot};
use tracing::{debug, info};

impl SessionActor {
    /// Returns false once the session has been left.
    pub(super) async fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::SendChat { content, reply } => {
                let result = self.chat.outbound(content).map(|(message, echo)| {
                    self.transport.send(message);
                    self.emit(SessionEvent::Chat(echo.clone()));
                    echo
                });
                let _ = reply.send(result);
            }

            SessionCommand::SetAudioEnabled { enabled, reply } => {
                self.media.set_audio_enabled(enabled);
                info!("Audio {}", if enabled { "unmuted" } else { "muted" });
                let _ = reply.send(self.media.state().clone());
            }

            SessionCommand::SetVideoEnabled { enabled, reply } => {
                self.media.set_video_enabled(enabled);
                info!("Video {}", if enabled { "on" } else { "off" });
                let _ = reply.send(self.media.state().clone());
            }

            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(SessionSnapshot {
                    state: *self.state.borrow(),
                    peers: self.mesh.summaries(),
                    local_media: self.media.state().clone(),
                    chat_history: self.chat.history(),
                });
            }

            SessionCommand::Peers { reply } => {
                let _ = reply.send(self.mesh.summaries());
            }

            SessionCommand::LocalMedia { reply } => {
                let _ = reply.send(self.media.state().clone());
            }

            SessionCommand::Leave { reply } => {
                debug!("Leave requested by {}", self.client_id);
                self.shutdown().await;
                self.emit(SessionEvent::Disconnected { reason: None });
                let _ = reply.send(());
                return false;
            }
        }
        true
    }
}
