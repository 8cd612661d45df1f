//! `WebSocket` acceptor for the live viewport stream.
//!
//! Clients connect to the stream port (any path) and receive one binary
//! message per JPEG frame. The first client to connect switches
//! streaming on; the last one to leave switches it off. A client that
//! cannot keep up loses frames rather than delaying everyone else.
//! Anything a client sends besides ping and close is ignored.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use tracing::debug;

use crate::state::AppState;

/// Upgrade a request on the stream port to a frame subscription.
///
/// # Route
///
/// `GET /` and `GET /stream` on the stream port
pub async fn ws_stream(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Register with the hub, forward frames until either side goes away,
/// then deregister.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (id, mut frames) = state.stream.connect().await;

    loop {
        tokio::select! {
            frame = frames.recv() => {
                let Some(frame) = frame else {
                    debug!(client = id, "stream hub dropped client");
                    break;
                };
                if socket.send(Message::Binary(frame)).await.is_err() {
                    debug!(client = id, "stream client disconnected (send failed)");
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(client = id, "stream client disconnected");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        debug!(client = id, "stream socket error: {e}");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    state.stream.disconnect(id).await;
}
