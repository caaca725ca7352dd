//! Song request store
//!
//! Durable records of song requests. Every mutation is a single SQL
//! statement, so it is either fully applied or not observable at all.

use crate::db::songs;
use crate::error::{QueueError, Result};
use chrono::Utc;
use karaoke_common::db::{EventId, RequestId, RequestStatus, SongId, SongRequest};
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

const REQUEST_COLUMNS: &str =
    "id, event_id, song_id, requester_name, status, play_order, created_at";

/// Next position for an event: `MAX(play_order) + 1`, or 0 when empty.
///
/// The scan covers requests in every status, so a skipped or played tail
/// still advances the sequence and the pending view may show gaps.
const NEXT_ORDER_SQL: &str =
    "SELECT COALESCE(MAX(play_order) + 1, 0) FROM song_requests WHERE event_id = ?";

pub async fn event_exists<'e, E>(db: E, event_id: EventId) -> Result<bool>
where
    E: SqliteExecutor<'e>,
{
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = ?)")
        .bind(event_id)
        .fetch_one(db)
        .await?;
    Ok(exists)
}

/// Read the next play order without allocating it
pub async fn next_play_order<'e, E>(db: E, event_id: EventId) -> Result<i64>
where
    E: SqliteExecutor<'e>,
{
    let next: i64 = sqlx::query_scalar(NEXT_ORDER_SQL)
        .bind(event_id)
        .fetch_one(db)
        .await?;
    Ok(next)
}

/// Create a pending request at the end of the event's sequence
///
/// Validates the event (`NotFound`) and then the song (`InvalidReference`)
/// before writing. The write is one autocommit `INSERT ... SELECT`: the
/// order is computed inside the statement, and SQLite takes the write lock
/// when the statement starts, so concurrent writers wait on
/// `busy_timeout` rather than failing a read-to-write lock upgrade.
pub async fn create_request(
    db: &SqlitePool,
    event_id: EventId,
    song_id: SongId,
    requester_name: &str,
) -> Result<SongRequest> {
    if !event_exists(db, event_id).await? {
        return Err(QueueError::NotFound(format!("Event {}", event_id)));
    }

    match songs::get_song(db, song_id).await {
        Ok(_) => {}
        Err(QueueError::NotFound(_)) => return Err(QueueError::InvalidReference(song_id)),
        Err(e) => return Err(e),
    }

    let request = sqlx::query_as::<_, SongRequest>(&format!(
        r#"
        INSERT INTO song_requests (event_id, song_id, requester_name, status, play_order, created_at)
        SELECT ?, ?, ?, 'pending', COALESCE(MAX(play_order) + 1, 0), ?
        FROM song_requests WHERE event_id = ?
        RETURNING {REQUEST_COLUMNS}
        "#
    ))
    .bind(event_id)
    .bind(song_id)
    .bind(requester_name)
    .bind(Utc::now())
    .bind(event_id)
    .fetch_one(db)
    .await
    .map_err(|e| match e {
        // Song removed between validation and insert
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            QueueError::InvalidReference(song_id)
        }
        other => QueueError::TransientStoreFailure(other),
    })?;

    debug!(
        request_id = request.id,
        event_id,
        play_order = request.play_order,
        "Created song request"
    );
    Ok(request)
}

pub async fn get_request<'e, E>(db: E, request_id: RequestId) -> Result<SongRequest>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query_as::<_, SongRequest>(&format!(
        "SELECT {REQUEST_COLUMNS} FROM song_requests WHERE id = ?"
    ))
    .bind(request_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| QueueError::NotFound(format!("Song request {}", request_id)))
}

/// Compare-and-set status update
///
/// Writes `new_status` only if the row still holds `expected`. Returns the
/// updated record, or `None` when another writer changed it first.
pub async fn update_status_if<'e, E>(
    db: E,
    request_id: RequestId,
    expected: RequestStatus,
    new_status: RequestStatus,
) -> Result<Option<SongRequest>>
where
    E: SqliteExecutor<'e>,
{
    let updated = sqlx::query_as::<_, SongRequest>(&format!(
        "UPDATE song_requests SET status = ? WHERE id = ? AND status = ? RETURNING {REQUEST_COLUMNS}"
    ))
    .bind(new_status)
    .bind(request_id)
    .bind(expected)
    .fetch_optional(db)
    .await?;

    Ok(updated)
}

/// Requests of one event, optionally filtered by status, ascending by order
pub async fn list_requests(
    db: &SqlitePool,
    event_id: EventId,
    status: Option<RequestStatus>,
) -> Result<Vec<SongRequest>> {
    let requests = match status {
        Some(status) => {
            sqlx::query_as::<_, SongRequest>(&format!(
                "SELECT {REQUEST_COLUMNS} FROM song_requests \
                 WHERE event_id = ? AND status = ? ORDER BY play_order ASC"
            ))
            .bind(event_id)
            .bind(status)
            .fetch_all(db)
            .await?
        }
        None => {
            sqlx::query_as::<_, SongRequest>(&format!(
                "SELECT {REQUEST_COLUMNS} FROM song_requests \
                 WHERE event_id = ? ORDER BY play_order ASC"
            ))
            .bind(event_id)
            .fetch_all(db)
            .await?
        }
    };

    Ok(requests)
}
