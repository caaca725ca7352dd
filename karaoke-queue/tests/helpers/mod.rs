//! Shared fixtures for karaoke-queue integration tests
//!
//! Every test gets a fresh database seeded with two events (42, 43) and
//! two songs (7, 9): in memory by default, on disk for tests that need
//! real connection-level concurrency.

#![allow(dead_code)]

use karaoke_common::db::{init_database, init_in_memory};
use karaoke_common::events::QueueEvent;
use karaoke_queue::hub::{LiveHub, Subscription};
use karaoke_queue::queue::QueueService;
use karaoke_queue::{build_state, AppState};
use sqlx::SqlitePool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub const EVENT: i64 = 42;
pub const OTHER_EVENT: i64 = 43;
pub const SONG_A: i64 = 7;
pub const SONG_B: i64 = 9;

pub async fn seeded_pool() -> SqlitePool {
    let pool = init_in_memory().await.expect("in-memory database");
    seed_fixtures(&pool).await;
    pool
}

/// On-disk database with the production pool settings (WAL, several
/// connections); `dir` must outlive the pool
pub async fn seeded_disk_pool(dir: &Path) -> SqlitePool {
    let pool = init_database(&dir.join("karaoke.db"))
        .await
        .expect("on-disk database");
    seed_fixtures(&pool).await;
    pool
}

/// Add events `first..=last` beyond the fixture events
pub async fn add_events(pool: &SqlitePool, first: i64, last: i64) {
    for id in first..=last {
        sqlx::query("INSERT INTO events (id, event_type, status) VALUES (?, 'party', 'confirmed')")
            .bind(id)
            .execute(pool)
            .await
            .expect("seed extra event");
    }
}

async fn seed_fixtures(pool: &SqlitePool) {
    sqlx::query(
        "INSERT INTO events (id, event_type, date, location, status) VALUES \
         (42, 'birthday', '2026-10-17', 'Salón Azul', 'confirmed'), \
         (43, 'wedding', '2026-10-18', 'Quinta Rosa', 'confirmed')",
    )
    .execute(pool)
    .await
    .expect("seed events");

    sqlx::query(
        "INSERT INTO songs (id, artist, title, language, duration_seconds, genre_tags) VALUES \
         (7, 'Queen', 'Bohemian Rhapsody', 'English', 354, 'Rock,Classic'), \
         (9, 'Luis Miguel', 'La Barca', 'Spanish', 210, 'Bolero,Latin')",
    )
    .execute(pool)
    .await
    .expect("seed songs");
}

pub async fn service() -> Arc<QueueService> {
    Arc::new(QueueService::new(seeded_pool().await, LiveHub::new(16)))
}

pub async fn app_state() -> AppState {
    build_state(seeded_pool().await, 16, Duration::from_secs(15))
}

/// Next notification on `sub`, failing the test after one second
pub async fn next_event(sub: &mut Subscription) -> QueueEvent {
    let text = tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("notification within timeout")
        .expect("subscription still open");
    serde_json::from_str(&text).expect("valid QueueEvent JSON")
}
