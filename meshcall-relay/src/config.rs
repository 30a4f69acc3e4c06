use crate::error::RelayError;
use meshcall_core::DEFAULT_WS_PATH;
use std::env;
use std::net::SocketAddr;

pub const DEFAULT_RELAY_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Mount point of the room sockets, without slashes.
    pub ws_path: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ws_path: DEFAULT_WS_PATH.to_owned(),
        }
    }
}

impl RelayConfig {
    pub fn new(bind_addr: &str, ws_path: &str) -> Result<Self, RelayError> {
        let bind_addr = bind_addr.parse().map_err(|e: std::net::AddrParseError| {
            RelayError::InvalidAddr {
                addr: bind_addr.to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            bind_addr,
            ws_path: ws_path.trim_matches('/').to_owned(),
        })
    }

    /// Reads `MESHCALL_RELAY_ADDR` and `MESHCALL_WS_PATH`.
    pub fn from_env() -> Result<Self, RelayError> {
        let addr = env::var("MESHCALL_RELAY_ADDR").unwrap_or_else(|_| DEFAULT_RELAY_ADDR.into());
        let ws_path = env::var("MESHCALL_WS_PATH").unwrap_or_else(|_| DEFAULT_WS_PATH.into());
        Self::new(&addr, &ws_path)
    }

    /// Route of the room socket, e.g. `/ws/{room}/{client}`.
    pub fn socket_route(&self) -> String {
        if self.ws_path.is_empty() {
            "/{room}/{client}".to_owned()
        } else {
            format!("/{}/{{room}}/{{client}}", self.ws_path)
        }
    }
}
