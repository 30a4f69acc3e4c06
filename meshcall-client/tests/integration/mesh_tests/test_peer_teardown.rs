use meshcall_client::peer::PeerConnectionState;
use meshcall_client::{ClientId, SessionEvent, SignalMessage};

use crate::integration::{TestSessionBuilder, init_tracing};
use crate::utils::PeerCall;

/// Pending c2 leaves: entry removed, one user-left, a later answer ignored.
#[tokio::test]
async fn test_user_left_while_pending() {
    init_tracing();

    let mut t = TestSessionBuilder::new("r1", "c1").join().await.unwrap();
    t.remote
        .deliver(SignalMessage::user_joined(ClientId::from("c2")))
        .await;
    t.remote.next_sent().await.expect("no offer");
    t.settle().await.unwrap();

    t.remote
        .deliver(SignalMessage::user_left(ClientId::from("c2")))
        .await;
    t.remote
        .deliver(SignalMessage::answer(
            ClientId::from("c2"),
            ClientId::from("c1"),
            "v=0 late",
        ))
        .await;
    t.remote
        .deliver(SignalMessage::user_left(ClientId::from("c2")))
        .await;

    let events = t.settle().await.unwrap();
    let left: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::UserLeft { peer_id } if peer_id.as_str() == "c2"))
        .collect();
    assert_eq!(left.len(), 1);
    assert_eq!(events.len(), 1);

    let connection = t.factory.connection("c2").unwrap();
    assert!(connection.is_closed());
    assert!(
        !connection
            .calls()
            .iter()
            .any(|c| matches!(c, PeerCall::SetRemote(_)))
    );
    assert!(t.session.peers().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_user_left_for_unknown_peer_is_noop() {
    init_tracing();

    let mut t = TestSessionBuilder::new("r1", "c1").join().await.unwrap();
    t.remote
        .deliver(SignalMessage::user_left(ClientId::from("nobody")))
        .await;

    let events = t.settle().await.unwrap();
    assert!(events.is_empty());
    assert!(t.remote.sent().is_empty());
}

#[tokio::test]
async fn test_failed_connection_is_torn_down_once() {
    init_tracing();

    let mut t = TestSessionBuilder::new("r1", "c1").join().await.unwrap();
    t.remote
        .deliver(SignalMessage::user_joined(ClientId::from("c2")))
        .await;
    t.remote.next_sent().await.expect("no offer");
    t.settle().await.unwrap();

    let connection = t.factory.connection("c2").unwrap();
    assert!(connection.emit_state(PeerConnectionState::Connected));
    assert!(connection.emit_state(PeerConnectionState::Failed));
    assert!(connection.emit_state(PeerConnectionState::Closed));

    let event = crate::integration::wait_for_event(&mut t.events, |e| {
        matches!(e, SessionEvent::UserLeft { .. })
    })
    .await
    .unwrap();
    assert!(matches!(event, SessionEvent::UserLeft { peer_id } if peer_id.as_str() == "c2"));

    // The remote side's user-left arriving afterwards changes nothing.
    t.remote
        .deliver(SignalMessage::user_left(ClientId::from("c2")))
        .await;
    let events = t.settle().await.unwrap();
    assert!(events.is_empty());
    assert!(connection.is_closed());
}
