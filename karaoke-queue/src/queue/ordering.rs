//! Queue ordering engine
//!
//! Positions come from the store: the next order for an event is
//! `MAX(play_order) + 1` over all of its requests, computed inside the
//! INSERT that creates the request. There is no in-memory sequence to
//! reconcile after a restart.
//!
//! [`EventLocks`] serializes the whole submit sequence (validate, insert,
//! broadcast) per event inside this process, so notifications for one
//! event leave in the same order their positions were allocated.
//! Different events never wait on each other.

use crate::db::requests;
use crate::error::Result;
use karaoke_common::db::{EventId, RequestStatus, SongRequest};
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Idle lock entries are pruned once the map grows past this size
const PRUNE_THRESHOLD: usize = 1024;

/// One async mutex per event id
#[derive(Default)]
pub struct EventLocks {
    locks: Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>,
}

impl EventLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the event's lock; released when the guard drops
    pub async fn lock(&self, event_id: EventId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            if locks.len() > PRUNE_THRESHOLD {
                // Only the map holds a reference: nobody is waiting or locked
                locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(locks.entry(event_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of event ids currently tracked
    pub fn tracked_events(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Order allocation and the operator-facing queue view
pub struct QueueOrdering {
    db: SqlitePool,
    locks: EventLocks,
}

impl QueueOrdering {
    pub fn new(db: SqlitePool) -> Self {
        Self {
            db,
            locks: EventLocks::new(),
        }
    }

    /// Serialize submissions for `event_id`
    pub async fn lock_event(&self, event_id: EventId) -> OwnedMutexGuard<()> {
        self.locks.lock(event_id).await
    }

    /// Position the next request of `event_id` would receive
    pub async fn next_order(&self, event_id: EventId) -> Result<i64> {
        requests::next_play_order(&self.db, event_id).await
    }

    /// Pending requests of the event, ascending by `play_order`
    ///
    /// Never contains playing, played or skipped entries.
    pub async fn dequeue_view(&self, event_id: EventId) -> Result<Vec<SongRequest>> {
        requests::list_requests(&self.db, event_id, Some(RequestStatus::Pending)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_event_serialized() {
        let locks = Arc::new(EventLocks::new());
        let guard = locks.lock(1).await;

        let contender = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!contender.is_finished(), "Second lock on same event must wait");

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_events_do_not_contend() {
        let locks = EventLocks::new();
        let _a = locks.lock(1).await;

        tokio::time::timeout(Duration::from_millis(200), locks.lock(2))
            .await
            .expect("Lock for another event must not block");
        assert_eq!(locks.tracked_events(), 2);
    }
}
