//! WebSocket connection handlers.
//!
//! One reader task and one writer task per connection. The reader handles
//! inbound frames one at a time; the writer drains the connection's outbound
//! queue. When either stops, the other is aborted and the session torn down.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, ConnectionIdFactory, ErrorKind, Outbound, OutboundEvent},
    infrastructure::dto::websocket::{ClientEvent, encode},
    ui::state::AppState,
};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id = ConnectionIdFactory::generate();

    // Create a channel for this connection to receive events
    let (tx, mut rx) = mpsc::unbounded_channel();

    if let Err(e) = state
        .connect_session()
        .execute(connection_id.clone(), tx.clone())
        .await
    {
        tracing::error!("Failed to register connection '{}': {}", connection_id, e);
        return;
    }
    tracing::info!("Connection '{}' accepted", connection_id);

    let (mut sender, mut receiver) = socket.split();

    let reader_state = state.clone();
    let reader_id = connection_id.clone();

    // Spawn a task to receive events from this connection
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", reader_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    tracing::debug!("Received from '{}': {}", reader_id, text.as_str());
                    handle_text(&reader_state, &reader_id, text.as_str(), &tx).await;
                }
                Message::Binary(_) => {
                    tracing::debug!("Ignoring binary frame from '{}'", reader_id);
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", reader_id);
                    break;
                }
                // Ping/pong is handled automatically by the WebSocket protocol
                _ => {}
            }
        }
    });

    let writer_id = connection_id.clone();

    // Spawn a task to push queued events to this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match encode(&event) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to encode event for '{}': {}", writer_id, e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other. Use case steps that
    // have side effects run on their own tasks and are not cut short here.
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.disconnect_session().execute(&connection_id).await;
}

/// Decode one text frame and run the matching use case. Rejections are
/// reported back on the connection's own queue.
async fn handle_text(state: &AppState, connection_id: &ConnectionId, text: &str, reply: &Outbound) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("Malformed frame from '{}': {}", connection_id, e);
            send_reply(
                reply,
                OutboundEvent::error(ErrorKind::InvalidInput, format!("malformed event: {e}")),
            );
            return;
        }
    };

    let rejection = match event {
        ClientEvent::JoinRoom { username, room } => {
            match state.join_room().execute(connection_id, username, room).await {
                Ok(outcome) => {
                    tracing::debug!(
                        "Replayed {} message(s) of '{}' to '{}'",
                        outcome.replayed,
                        outcome.room,
                        connection_id
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!("Join from '{}' rejected: {}", connection_id, e);
                    Some(OutboundEvent::error(e.kind(), e.to_string()))
                }
            }
        }
        ClientEvent::ChatMessage { body } => {
            match state.send_message().execute(connection_id, body).await {
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Message from '{}' rejected: {}", connection_id, e);
                    Some(OutboundEvent::error(e.kind(), e.to_string()))
                }
            }
        }
    };

    if let Some(event) = rejection {
        send_reply(reply, event);
    }
}

fn send_reply(reply: &Outbound, event: OutboundEvent) {
    if reply.send(event).is_err() {
        tracing::debug!("Reply dropped; connection already closing");
    }
}
