//! WebSocket queue subscription
//!
//! The connection is `Connecting` during the HTTP upgrade and only joins
//! the hub once the handshake completes. From then on the server pushes
//! every queue notification for the event as a JSON text frame. Client
//! frames carry no meaning; only Close is acted on.

use super::AppState;
use crate::db::requests;
use crate::error::{QueueError, Result};
use crate::hub::PendingSubscription;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use karaoke_common::db::EventId;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// GET /karaoke/ws/events/:event_id/queue
pub async fn queue_socket(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    ws: WebSocketUpgrade,
) -> Result<Response> {
    if !requests::event_exists(state.service.db(), event_id).await? {
        return Err(QueueError::NotFound(format!("Event {}", event_id)));
    }

    let pending = state.service.hub().connect(event_id);
    debug!(event_id, connection_id = %pending.id(), "WebSocket connecting");

    let keepalive = state.keepalive;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, pending, keepalive)))
}

async fn handle_socket(socket: WebSocket, pending: PendingSubscription, keepalive: Duration) {
    let mut subscription = pending.open();
    let event_id = subscription.event_id();
    let connection_id = subscription.id();
    info!(event_id, %connection_id, "WebSocket subscriber connected");

    let (mut ws_sink, mut ws_stream) = socket.split();

    let mut ping = tokio::time::interval_at(Instant::now() + keepalive, keepalive);

    loop {
        tokio::select! {
            outgoing = subscription.recv() => {
                match outgoing {
                    Some(message) => {
                        if ws_sink.send(Message::Text(message.payload().to_string())).await.is_err() {
                            debug!(event_id, %connection_id, "WebSocket send failed");
                            break;
                        }
                    }
                    None => {
                        // Closed by the hub (hung outbox or shutdown)
                        let _ = ws_sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            _ = ping.tick() => {
                if ws_sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            incoming = ws_stream.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        warn!(event_id, %connection_id, "WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    // Dropping the subscription deregisters it
    drop(subscription);
    info!(event_id, %connection_id, "WebSocket subscriber disconnected");
}
