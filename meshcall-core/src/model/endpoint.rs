use crate::error::ProtocolError;
use crate::model::ids::{ClientId, RoomId};
use url::Url;

/// Mount point of the signaling WebSocket on the endpoint host.
pub const DEFAULT_WS_PATH: &str = "ws";

/// Address of a room-scoped signaling endpoint.
///
/// Connections are made to `{scheme}://{host}/{ws-path}/{room}/{client}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalingEndpoint {
    base: Url,
    ws_path: String,
}

impl SignalingEndpoint {
    /// `base` may use `ws`/`wss`, or `http`/`https` which are mapped to the
    /// matching WebSocket scheme.
    pub fn new(base: &str, ws_path: &str) -> Result<Self, ProtocolError> {
        let mut url =
            Url::parse(base).map_err(|e| ProtocolError::InvalidEndpoint(format!("{base}: {e}")))?;

        let scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(ProtocolError::InvalidEndpoint(format!(
                    "unsupported scheme {other:?}"
                )));
            }
        };
        if url.scheme() != scheme {
            url.set_scheme(scheme)
                .map_err(|_| ProtocolError::InvalidEndpoint(format!("cannot use {scheme}")))?;
        }
        if url.host_str().is_none() {
            return Err(ProtocolError::InvalidEndpoint(format!("{base}: missing host")));
        }
        url.set_query(None);
        url.set_fragment(None);

        Ok(Self {
            base: url,
            ws_path: ws_path.trim_matches('/').to_owned(),
        })
    }

    pub fn ws_path(&self) -> &str {
        &self.ws_path
    }

    pub fn url_for(&self, room: &RoomId, client: &ClientId) -> Result<Url, ProtocolError> {
        room.validate()?;
        client.validate()?;

        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ProtocolError::InvalidEndpoint(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(self.ws_path.split('/').filter(|s| !s.is_empty()));
            segments.push(room.as_str());
            segments.push(client.as_str());
        }
        Ok(url)
    }
}

impl Default for SignalingEndpoint {
    fn default() -> Self {
        Self {
            base: Url::parse("ws://127.0.0.1:3000").unwrap_or_else(|_| unreachable!()),
            ws_path: DEFAULT_WS_PATH.to_owned(),
        }
    }
}
