//! HTTP API: REST handlers plus WebSocket and SSE subscriptions

pub mod caller;
pub mod handlers;
pub mod health;
pub mod sse;
pub mod ws;

use crate::queue::QueueService;
use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use caller::{Caller, Role, ROLE_HEADER};
pub use health::HealthResponse;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<QueueService>,
    /// SSE keep-alive and WebSocket ping interval
    pub keepalive: Duration,
}

impl AppState {
    pub fn new(service: Arc<QueueService>, keepalive: Duration) -> Self {
        Self {
            service,
            // Zero would make the ping interval panic
            keepalive: keepalive.max(Duration::from_secs(1)),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let karaoke = Router::new()
        // Catalog
        .route("/songs", get(handlers::list_songs))
        .route("/songs/import", post(handlers::import_songs))
        .route("/import", post(handlers::import_csv))
        // Requests
        .route(
            "/events/:event_id/requests",
            post(handlers::submit_request).get(handlers::list_requests),
        )
        .route("/events/:event_id/queue", get(handlers::list_queue))
        .route("/requests/:request_id/status", patch(handlers::advance_status))
        // Live subscriptions
        .route("/ws/events/:event_id/queue", get(ws::queue_socket))
        .route("/events/:event_id/stream", get(sse::queue_stream));

    Router::new()
        .merge(health::health_routes())
        .nest("/karaoke", karaoke)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
