//! Queue service
//!
//! Entry points for the HTTP layer and the import tool. Validation happens
//! before any write; a change is broadcast only after it has committed.

use crate::db::{requests, songs};
use crate::error::{QueueError, Result};
use crate::hub::LiveHub;
use crate::queue::import::{self, SongRow};
use crate::queue::ordering::QueueOrdering;
use karaoke_common::db::{EventId, RequestId, RequestStatus, Song, SongId, SongRequest};
use karaoke_common::events::QueueEvent;
use sqlx::SqlitePool;
use tracing::{debug, info};

pub struct QueueService {
    db: SqlitePool,
    ordering: QueueOrdering,
    hub: LiveHub,
}

impl QueueService {
    pub fn new(db: SqlitePool, hub: LiveHub) -> Self {
        Self {
            ordering: QueueOrdering::new(db.clone()),
            db,
            hub,
        }
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    pub fn hub(&self) -> &LiveHub {
        &self.hub
    }

    /// Add a pending request at the end of the event's queue
    ///
    /// Fails with `MalformedInput` for a blank name, `NotFound` for an
    /// unknown event and `InvalidReference` for an unknown song. Nothing is
    /// written or broadcast on failure.
    pub async fn submit_request(
        &self,
        event_id: EventId,
        song_id: SongId,
        requester_name: &str,
    ) -> Result<SongRequest> {
        let requester_name = requester_name.trim();
        if requester_name.is_empty() {
            return Err(QueueError::MalformedInput(
                "requester_name must not be empty".to_string(),
            ));
        }

        let _guard = self.ordering.lock_event(event_id).await;

        let request = requests::create_request(&self.db, event_id, song_id, requester_name).await?;

        let report = self.hub.broadcast(&QueueEvent::request_added(request.clone()));
        info!(
            request_id = request.id,
            event_id,
            play_order = request.play_order,
            notified = report.delivered,
            "Song request submitted"
        );

        Ok(request)
    }

    /// Move a request to `new_status`
    ///
    /// Moving to the status it already has is a no-op: the record is
    /// returned unchanged and nothing is broadcast.
    pub async fn advance_status(
        &self,
        request_id: RequestId,
        new_status: RequestStatus,
    ) -> Result<SongRequest> {
        let current = requests::get_request(&self.db, request_id).await?;

        if current.status == new_status {
            debug!(request_id, status = %new_status, "Status unchanged");
            return Ok(current);
        }
        if !current.status.can_transition_to(new_status) {
            return Err(QueueError::InvalidTransition {
                from: current.status,
                to: new_status,
            });
        }

        let _guard = self.ordering.lock_event(current.event_id).await;

        let updated =
            requests::update_status_if(&self.db, request_id, current.status, new_status).await?;

        let Some(updated) = updated else {
            // Lost the race: report against what is stored now
            let latest = requests::get_request(&self.db, request_id).await?;
            if latest.status == new_status {
                return Ok(latest);
            }
            return Err(QueueError::InvalidTransition {
                from: latest.status,
                to: new_status,
            });
        };

        let report = self
            .hub
            .broadcast(&QueueEvent::status_changed(current.status, updated.clone()));
        info!(
            request_id,
            event_id = updated.event_id,
            from = %current.status,
            to = %new_status,
            notified = report.delivered,
            "Song request status changed"
        );

        Ok(updated)
    }

    /// Pending requests of an event in play order
    pub async fn list_queue(&self, event_id: EventId) -> Result<Vec<SongRequest>> {
        self.ordering.dequeue_view(event_id).await
    }

    /// Every request of an event regardless of status
    pub async fn list_requests(&self, event_id: EventId) -> Result<Vec<SongRequest>> {
        requests::list_requests(&self.db, event_id, None).await
    }

    pub async fn next_order(&self, event_id: EventId) -> Result<i64> {
        self.ordering.next_order(event_id).await
    }

    pub async fn list_songs(&self) -> Result<Vec<Song>> {
        songs::list_songs(&self.db).await
    }

    /// Validate and insert catalog rows; all or nothing
    pub async fn import_songs(&self, rows: Vec<SongRow>) -> Result<usize> {
        let new_songs = import::validate_rows(rows)?;
        if new_songs.is_empty() {
            return Ok(0);
        }
        songs::insert_songs(&self.db, &new_songs).await
    }

    /// Insert the sample catalog, but only into an empty catalog
    pub async fn seed_catalog(&self) -> Result<usize> {
        let existing = songs::count_songs(&self.db).await?;
        if existing > 0 {
            info!("Catalog already has {} songs, skipping seed", existing);
            return Ok(0);
        }
        songs::insert_songs(&self.db, &import::sample_songs()).await
    }

    /// Import a CSV upload
    pub async fn import_csv(&self, filename: &str, content: &str) -> Result<usize> {
        import::ensure_csv_filename(filename)?;
        let rows = import::parse_csv(content)?;
        self.import_songs(rows).await
    }
}
