use std::sync::Arc;
use std::time::Duration;

use meshcall_client::media::SampleTrackSource;
use meshcall_client::peer::RtcPeerConnectionFactory;
use meshcall_client::transport::WsConnector;
use meshcall_client::{
    CallClient, ClientConfig, ClientId, Session, SessionEvent, SessionEvents, SessionState,
};

use super::{start_relay, wait_for_stable_peers};
use crate::integration::{init_tracing, wait_for_event};
use crate::utils::{MockMediaSource, MockPeerFactory};

fn config_for(addr: std::net::SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::with_endpoint(&format!("http://{addr}"), "ws").unwrap();
    config.ice_servers = Vec::new();
    config
}

async fn join_mocked(config: &ClientConfig, id: &str) -> (Session, SessionEvents) {
    let client = CallClient::new(
        config.clone(),
        Arc::new(WsConnector::new(config.endpoint.clone())),
        Arc::new(MockPeerFactory::new(id)),
        Arc::new(MockMediaSource::working()),
    );
    let (session, mut events) = client.join("r1", Some(ClientId::from(id))).await.unwrap();
    wait_for_event(&mut events, |e| matches!(e, SessionEvent::Connected { .. }))
        .await
        .unwrap();
    // The relay registers the socket after the handshake completes.
    tokio::time::sleep(Duration::from_millis(50)).await;
    (session, events)
}

#[tokio::test]
async fn test_sessions_negotiate_through_relay() {
    init_tracing();
    let addr = start_relay().await;
    let config = config_for(addr);

    let (mut a, _a_events) = join_mocked(&config, "a").await;
    let (mut b, mut b_events) = join_mocked(&config, "b").await;
    let (mut c, _c_events) = join_mocked(&config, "c").await;

    for session in [&a, &b, &c] {
        wait_for_stable_peers(session, 2, Duration::from_secs(5)).await;
    }

    a.send_chat("over the wire").await.unwrap();
    let event = wait_for_event(&mut b_events, |e| matches!(e, SessionEvent::Chat(_)))
        .await
        .unwrap();
    let SessionEvent::Chat(chat) = event else {
        unreachable!()
    };
    assert_eq!(chat.sender.to_string(), "a");

    a.leave().await.unwrap();
    wait_for_event(&mut b_events, |e| {
        matches!(e, SessionEvent::UserLeft { peer_id } if peer_id.as_str() == "a")
    })
    .await
    .unwrap();
    wait_for_stable_peers(&c, 1, Duration::from_secs(5)).await;

    b.leave().await.unwrap();
    c.leave().await.unwrap();
    assert_eq!(a.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_unreachable_relay_ends_session() {
    init_tracing();

    // Bind and drop to get a port with nothing listening.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };
    let config = config_for(addr);
    let client = CallClient::new(
        config.clone(),
        Arc::new(WsConnector::new(config.endpoint.clone())),
        Arc::new(MockPeerFactory::new("a")),
        Arc::new(MockMediaSource::working()),
    );

    let (session, mut events) = client.join("r1", Some(ClientId::from("a"))).await.unwrap();
    let event = wait_for_event(&mut events, |e| matches!(e, SessionEvent::Error(_)))
        .await
        .unwrap();
    let SessionEvent::Error(error) = event else {
        unreachable!()
    };
    assert!(error.is_fatal());
    wait_for_event(&mut events, |e| matches!(e, SessionEvent::Disconnected { .. }))
        .await
        .unwrap();
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_native_connections_negotiate() {
    init_tracing();
    let addr = start_relay().await;
    let config = config_for(addr);

    let mut sessions = Vec::new();
    for id in ["n1", "n2"] {
        let client = CallClient::new(
            config.clone(),
            Arc::new(WsConnector::new(config.endpoint.clone())),
            Arc::new(RtcPeerConnectionFactory::new(Vec::new()).unwrap()),
            Arc::new(SampleTrackSource),
        );
        let (session, mut events) = client.join("native", Some(ClientId::from(id))).await.unwrap();
        wait_for_event(&mut events, |e| matches!(e, SessionEvent::Connected { .. }))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        sessions.push(session);
    }

    for session in &sessions {
        wait_for_stable_peers(session, 1, Duration::from_secs(10)).await;
    }

    for session in &mut sessions {
        session.leave().await.unwrap();
    }
}
