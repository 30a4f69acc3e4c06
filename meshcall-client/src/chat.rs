use crate::error::SessionError;
use meshcall_core::{ClientId, SignalMessage};
use std::collections::VecDeque;
use std::fmt;

const UNKNOWN_SENDER: &str = "unknown";

/// Messages kept for snapshots. Older ones are dropped first.
pub const CHAT_HISTORY_LIMIT: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatSender {
    Local,
    Peer(ClientId),
}

impl fmt::Display for ChatSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("self"),
            Self::Peer(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: ChatSender,
    pub content: String,
}

/// Room-wide text chat carried over the signaling channel.
#[derive(Debug)]
pub(crate) struct ChatRelay {
    local_id: ClientId,
    history: VecDeque<ChatMessage>,
}

impl ChatRelay {
    pub(crate) fn new(local_id: ClientId) -> Self {
        Self {
            local_id,
            history: VecDeque::new(),
        }
    }

    /// Builds the broadcast message and records the local echo.
    pub(crate) fn outbound(
        &mut self,
        content: String,
    ) -> Result<(SignalMessage, ChatMessage), SessionError> {
        if content.trim().is_empty() {
            return Err(SessionError::ChatRejected("message is empty".into()));
        }
        let message = SignalMessage::chat(self.local_id.clone(), content.clone());
        let echo = ChatMessage {
            sender: ChatSender::Local,
            content,
        };
        self.record(echo.clone());
        Ok((message, echo))
    }

    pub(crate) fn inbound(&mut self, sender: Option<ClientId>, content: String) -> ChatMessage {
        let sender = match sender {
            Some(id) if id == self.local_id => ChatSender::Local,
            Some(id) => ChatSender::Peer(id),
            None => ChatSender::Peer(ClientId::from(UNKNOWN_SENDER)),
        };
        let message = ChatMessage { sender, content };
        self.record(message.clone());
        message
    }

    /// Oldest first.
    pub(crate) fn history(&self) -> Vec<ChatMessage> {
        self.history.iter().cloned().collect()
    }

    fn record(&mut self, message: ChatMessage) {
        if self.history.len() == CHAT_HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(message);
    }
}
