//! karaoke-queue library - live song request queue
//!
//! Guests submit song requests for an event; each request gets the next
//! position in that event's queue. Operators move requests through
//! `pending -> playing -> played` (or `pending -> skipped`), and every
//! change is pushed to the event's live subscribers over WebSocket or SSE.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod queue;

pub use api::{build_router, AppState};
pub use error::{QueueError, Result};

use crate::hub::LiveHub;
use crate::queue::QueueService;
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Duration;

/// Wire the service, hub and HTTP state together
pub fn build_state(db: SqlitePool, outbox_capacity: usize, keepalive: Duration) -> AppState {
    let hub = LiveHub::new(outbox_capacity);
    let service = Arc::new(QueueService::new(db, hub));
    AppState::new(service, keepalive)
}
