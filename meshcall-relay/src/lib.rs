mod config;
mod error;
mod room;
mod signaling;

pub use config::*;
pub use error::*;
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

/// Router serving room sockets under the configured path plus `/health`.
pub fn router(config: &RelayConfig, registry: RoomRegistry) -> Router {
    Router::new()
        .route(&config.socket_route(), get(ws_handler))
        .route("/health", get(health))
        .with_state(registry)
}

/// Serves the relay on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, config: RelayConfig) -> Result<(), RelayError> {
    let registry = RoomRegistry::new();
    let app = router(&config, registry);

    info!(
        "Signaling relay listening on http://{} (rooms under /{})",
        listener.local_addr()?,
        config.ws_path
    );
    axum::serve(listener, app).await?;
    Ok(())
}

pub async fn run(config: RelayConfig) -> Result<(), RelayError> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve(listener, config).await
}
