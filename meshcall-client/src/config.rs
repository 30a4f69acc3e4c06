use crate::error::SessionError;
use crate::media::MediaConstraints;
use meshcall_core::utils::default_ice_servers;
use meshcall_core::{DEFAULT_WS_PATH, IceServerConfig, SignalingEndpoint};
use std::env;

pub const DEFAULT_SIGNALING_URL: &str = "ws://127.0.0.1:3000";
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: SignalingEndpoint,
    pub ice_servers: Vec<IceServerConfig>,
    pub media: MediaConstraints,
    /// Buffer of the session event channel. Slow subscribers lag past it.
    pub event_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: SignalingEndpoint::default(),
            ice_servers: default_ice_servers(),
            media: MediaConstraints::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Reads `MESHCALL_SIGNALING_URL` and `MESHCALL_WS_PATH`, plus an optional
    /// TURN server from `TURN_URL`, `TURN_USERNAME` and `TURN_CREDENTIAL`.
    pub fn from_env() -> Result<Self, SessionError> {
        let url = env::var("MESHCALL_SIGNALING_URL").unwrap_or_else(|_| DEFAULT_SIGNALING_URL.into());
        let ws_path = env::var("MESHCALL_WS_PATH").unwrap_or_else(|_| DEFAULT_WS_PATH.into());

        let mut config = Self::with_endpoint(&url, &ws_path)?;
        if let Ok(turn_url) = env::var("TURN_URL") {
            config.ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: env::var("TURN_USERNAME").ok(),
                credential: env::var("TURN_CREDENTIAL").ok(),
            });
        }
        Ok(config)
    }

    pub fn with_endpoint(url: &str, ws_path: &str) -> Result<Self, SessionError> {
        let endpoint = SignalingEndpoint::new(url, ws_path)
            .map_err(|e| SessionError::InvalidConfig(e.to_string()))?;
        Ok(Self {
            endpoint,
            ..Self::default()
        })
    }

    pub fn media(mut self, media: MediaConstraints) -> Self {
        self.media = media;
        self
    }
}
