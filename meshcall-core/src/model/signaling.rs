use crate::error::ProtocolError;
use crate::model::ids::ClientId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SdpKind {
    Offer,
    Answer,
    Pranswer,
    Rollback,
}

/// Session description in the shape browsers serialize `RTCSessionDescription`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescription {
    #[serde(rename = "type")]
    pub kind: SdpKind,
    pub sdp: String,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidatePayload {
    pub candidate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_fragment: Option<String>,
}

/// Control message exchanged with the room signaling endpoint.
///
/// Negotiation messages are addressed with `target`; presence and chat are
/// broadcast. Presence names the affected participant in `clientId`, not
/// `sender`, which existing endpoints rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SignalMessage {
    Offer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ClientId>,
        payload: SessionDescription,
    },
    Answer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ClientId>,
        payload: SessionDescription,
    },
    IceCandidate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ClientId>,
        payload: IceCandidatePayload,
    },
    UserJoined {
        #[serde(rename = "clientId")]
        client_id: ClientId,
    },
    UserLeft {
        #[serde(rename = "clientId")]
        client_id: ClientId,
    },
    Chat {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sender: Option<ClientId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<ClientId>,
        content: String,
    },
    /// Any `type` this client does not understand. Ignored by consumers.
    #[serde(other)]
    #[serde(skip_serializing)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Offer,
    Answer,
    IceCandidate,
    UserJoined,
    UserLeft,
    Chat,
    Unknown,
}

impl SignalMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn offer(sender: ClientId, target: ClientId, sdp: impl Into<String>) -> Self {
        Self::Offer {
            sender: Some(sender),
            target: Some(target),
            payload: SessionDescription::offer(sdp),
        }
    }

    pub fn answer(sender: ClientId, target: ClientId, sdp: impl Into<String>) -> Self {
        Self::Answer {
            sender: Some(sender),
            target: Some(target),
            payload: SessionDescription::answer(sdp),
        }
    }

    pub fn ice_candidate(sender: ClientId, target: ClientId, payload: IceCandidatePayload) -> Self {
        Self::IceCandidate {
            sender: Some(sender),
            target: Some(target),
            payload,
        }
    }

    pub fn user_joined(client_id: ClientId) -> Self {
        Self::UserJoined { client_id }
    }

    pub fn user_left(client_id: ClientId) -> Self {
        Self::UserLeft { client_id }
    }

    /// Broadcast chat line. Chat never carries a target.
    pub fn chat(sender: ClientId, content: impl Into<String>) -> Self {
        Self::Chat {
            sender: Some(sender),
            target: None,
            content: content.into(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Offer { .. } => MessageKind::Offer,
            Self::Answer { .. } => MessageKind::Answer,
            Self::IceCandidate { .. } => MessageKind::IceCandidate,
            Self::UserJoined { .. } => MessageKind::UserJoined,
            Self::UserLeft { .. } => MessageKind::UserLeft,
            Self::Chat { .. } => MessageKind::Chat,
            Self::Unknown => MessageKind::Unknown,
        }
    }

    pub fn sender(&self) -> Option<&ClientId> {
        match self {
            Self::Offer { sender, .. }
            | Self::Answer { sender, .. }
            | Self::IceCandidate { sender, .. }
            | Self::Chat { sender, .. } => sender.as_ref(),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&ClientId> {
        match self {
            Self::Offer { target, .. }
            | Self::Answer { target, .. }
            | Self::IceCandidate { target, .. }
            | Self::Chat { target, .. } => target.as_ref(),
            _ => None,
        }
    }

    /// Replaces the sender of messages that carry one. Presence is left untouched.
    pub fn with_sender(mut self, id: ClientId) -> Self {
        match &mut self {
            Self::Offer { sender, .. }
            | Self::Answer { sender, .. }
            | Self::IceCandidate { sender, .. }
            | Self::Chat { sender, .. } => *sender = Some(id),
            _ => {}
        }
        self
    }
}
