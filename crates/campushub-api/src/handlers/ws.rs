//! WebSocket upgrade handler.
//!
//! The socket opens unauthenticated; the client's first event is
//! `connect{token}`, handled by the session manager. One read loop and
//! one outbound forwarder per connection; events for one connection are
//! processed in arrival order.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use campushub_realtime::event::{ClientEvent, ServerEvent};

use crate::state::AppState;

/// GET /ws
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(state, socket))
}

async fn handle_socket(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = state.engine.register_connection();
    let conn_id = handle.id;
    info!(%conn_id, "WebSocket connection established");

    let outbound_task = tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%conn_id, error = %err, "Failed to serialize outbound event");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let ack = match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => state.engine.handle_event(conn_id, event).await,
                    Err(err) => {
                        debug!(%conn_id, error = %err, "Malformed client event");
                        Some(ServerEvent::error("Malformed event"))
                    }
                };
                if let Some(ack) = ack {
                    handle.send(ack);
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                warn!(%conn_id, error = %err, "WebSocket error");
                break;
            }
        }
    }

    state.engine.disconnect(conn_id).await;
    outbound_task.abort();
    info!(%conn_id, "WebSocket connection closed");
}
