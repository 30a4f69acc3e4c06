use meshcall_client::{ClientId, SessionEvent, SignalMessage, TrackKind};

use crate::integration::{TestSessionBuilder, init_tracing, wait_for_event};

#[tokio::test]
async fn test_remote_tracks_are_grouped_into_one_stream() {
    init_tracing();

    let mut t = TestSessionBuilder::new("r1", "c1").join().await.unwrap();
    t.remote
        .deliver(SignalMessage::user_joined(ClientId::from("c2")))
        .await;
    t.remote.next_sent().await.expect("no offer");

    let connection = t.factory.connection("c2").unwrap();
    connection.emit_track(TrackKind::Audio, "stream-c2");
    connection.emit_track(TrackKind::Video, "stream-c2");

    let first = wait_for_event(&mut t.events, |e| matches!(e, SessionEvent::Track { .. }))
        .await
        .unwrap();
    let second = wait_for_event(&mut t.events, |e| matches!(e, SessionEvent::Track { .. }))
        .await
        .unwrap();

    let SessionEvent::Track { peer_id, stream } = first else {
        unreachable!()
    };
    assert_eq!(peer_id.as_str(), "c2");
    assert_eq!(stream.tracks.len(), 1);

    let SessionEvent::Track { stream, .. } = second else {
        unreachable!()
    };
    assert_eq!(stream.id, "stream-c2");
    assert_eq!(stream.tracks.len(), 2);

    let peers = t.session.peers().await.unwrap();
    let remote = peers[0].remote_stream.as_ref().expect("stream not recorded");
    assert_eq!(remote.tracks.len(), 2);
}
