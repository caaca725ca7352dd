//! Server-Sent Events rendition of the queue subscription
//!
//! Same notifications as the WebSocket route; the SSE event name is the
//! notification type (`RequestAdded`, `StatusChanged`).

use super::AppState;
use crate::db::requests;
use crate::error::{QueueError, Result};
use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use karaoke_common::db::EventId;
use std::convert::Infallible;
use tracing::debug;

/// GET /karaoke/events/:event_id/stream
pub async fn queue_stream(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    if !requests::event_exists(state.service.db(), event_id).await? {
        return Err(QueueError::NotFound(format!("Event {}", event_id)));
    }

    // The subscription lives inside the stream and deregisters when the
    // client goes away and axum drops the body
    let mut subscription = state.service.hub().subscribe(event_id);
    debug!(event_id, connection_id = %subscription.id(), "SSE subscriber connected");

    let stream = async_stream::stream! {
        while let Some(message) = subscription.recv().await {
            yield Ok::<Event, Infallible>(
                Event::default()
                    .event(message.event_type())
                    .data(message.payload()),
            );
        }
        debug!(event_id, "SSE subscription closed by hub");
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(state.keepalive)
            .text("keep-alive"),
    ))
}
