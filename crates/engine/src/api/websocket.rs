//! WebSocket push channel for universe broadcasts.
//!
//! One socket observes one universe: every envelope broadcast for it is
//! forwarded as a single JSON text frame, in broadcast order. The socket
//! is push-only; inbound text frames are ignored.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};

use orrery_domain::UniverseId;

use crate::app::App;

/// WebSocket upgrade handler - entry point for new subscribers.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(app): State<Arc<App>>,
) -> Response {
    let universe_id = UniverseId::from(id);
    ws.on_upgrade(move |socket| handle_socket(socket, app, universe_id))
}

async fn handle_socket(socket: WebSocket, app: Arc<App>, universe_id: UniverseId) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut subscription = app.hub.subscribe(&universe_id);

    tracing::info!(universe_id = %universe_id, "WebSocket subscriber connected");

    loop {
        tokio::select! {
            envelope = subscription.recv() => {
                let Some(envelope) = envelope else { break };
                let Ok(json) = serde_json::to_string(&envelope) else { continue };
                if ws_sender.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            incoming = ws_receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(universe_id = %universe_id, "WebSocket closed by client");
                        break;
                    }
                    Some(Ok(_)) => {} // push-only channel
                    Some(Err(e)) => {
                        tracing::warn!(universe_id = %universe_id, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        }
    }

    // Subscription drop unregisters from the hub.
    tracing::debug!(universe_id = %universe_id, "WebSocket subscriber disconnected");
}
