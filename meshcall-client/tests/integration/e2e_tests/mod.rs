pub mod test_relay_sessions;

use std::net::SocketAddr;
use std::time::Duration;

use meshcall_client::{NegotiationState, Session};
use meshcall_relay::{RelayConfig, serve};
use tokio::net::TcpListener;

/// Starts the reference relay on an ephemeral port.
pub async fn start_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind relay listener");
    let addr = listener.local_addr().expect("No local addr");
    tokio::spawn(async move {
        if let Err(e) = serve(listener, RelayConfig::default()).await {
            tracing::error!("Relay stopped: {}", e);
        }
    });
    addr
}

pub async fn wait_for_stable_peers(session: &Session, expected: usize, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let peers = session.peers().await.unwrap();
        if peers.len() == expected
            && peers
                .iter()
                .all(|p| p.negotiation == NegotiationState::Stable)
        {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "{} never converged: {:?}",
            session.client_id(),
            peers
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
