use crate::room::RoomRegistry;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{SinkExt, StreamExt};
use meshcall_core::{ClientId, RoomId, SignalMessage};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path((room, client)): Path<(String, String)>,
    State(registry): State<RoomRegistry>,
) -> Response {
    let room = RoomId::from(room);
    let client = ClientId::from(client);
    if let Err(e) = room.validate().and_then(|_| client.validate()) {
        warn!("Rejecting connection: {}", e);
        return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
    }

    ws.on_upgrade(move |socket| handle_socket(socket, room, client, registry))
}

async fn handle_socket(socket: WebSocket, room: RoomId, client: ClientId, registry: RoomRegistry) {
    info!("New WebSocket connection: {} in room {}", client, room);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    let connection = registry.join(&room, &client, tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
        let _ = sender.send(Message::Close(None)).await;
    });

    let mut recv_task = tokio::spawn({
        let registry = registry.clone();
        let room = room.clone();
        let client = client.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match SignalMessage::decode(text.as_str()) {
                        Ok(signal) => registry.route(&room, &client, signal),
                        Err(e) => warn!("Invalid SignalMessage from {}: {}", client, e),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    registry.leave(&room, &client, connection);
    info!("WebSocket disconnected: {} from room {}", client, room);
}

pub async fn health() -> &'static str {
    "ok"
}
