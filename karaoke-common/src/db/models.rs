//! Database models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use std::fmt;
use std::str::FromStr;

/// Opaque event identifier (owned by the booking subsystem)
pub type EventId = i64;
/// Song catalog identifier
pub type SongId = i64;
/// Song request identifier
pub type RequestId = i64;

/// Lifecycle of a song request
///
/// Legal moves: `Pending -> Playing -> Played` and `Pending -> Skipped`.
/// `Played` and `Skipped` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Playing,
    Played,
    Skipped,
}

impl RequestStatus {
    pub const ALL: [RequestStatus; 4] = [
        RequestStatus::Pending,
        RequestStatus::Playing,
        RequestStatus::Played,
        RequestStatus::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Playing => "playing",
            RequestStatus::Played => "played",
            RequestStatus::Skipped => "skipped",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Played | RequestStatus::Skipped)
    }

    /// Whether `self -> next` is a legal state change
    ///
    /// Same-status moves are not transitions; callers treat them as no-ops.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Playing)
                | (RequestStatus::Pending, RequestStatus::Skipped)
                | (RequestStatus::Playing, RequestStatus::Played)
        )
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "playing" => Ok(RequestStatus::Playing),
            "played" => Ok(RequestStatus::Played),
            "skipped" => Ok(RequestStatus::Skipped),
            other => Err(crate::Error::InvalidInput(format!(
                "Unknown request status: {}",
                other
            ))),
        }
    }
}

/// Catalog song
///
/// Created by bulk import; never mutated by the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: SongId,
    pub artist: String,
    pub title: String,
    pub language: Option<String>,
    pub duration_seconds: Option<i64>,
    pub genre_tags: Vec<String>,
}

impl<'r> FromRow<'r, SqliteRow> for Song {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let tags: Option<String> = row.try_get("genre_tags")?;
        Ok(Song {
            id: row.try_get("id")?,
            artist: row.try_get("artist")?,
            title: row.try_get("title")?,
            language: row.try_get("language")?,
            duration_seconds: row.try_get("duration_seconds")?,
            genre_tags: tags.as_deref().map(split_genre_tags).unwrap_or_default(),
        })
    }
}

/// Catalog entry awaiting insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSong {
    pub artist: String,
    pub title: String,
    pub language: Option<String>,
    pub duration_seconds: Option<i64>,
    pub genre_tags: Vec<String>,
}

impl NewSong {
    /// Tags in their stored, comma-separated form
    pub fn genre_tags_column(&self) -> Option<String> {
        if self.genre_tags.is_empty() {
            None
        } else {
            Some(self.genre_tags.join(","))
        }
    }
}

/// Split the stored comma-separated tag column
///
/// Trims each tag, drops empty segments and duplicates, keeps first-seen order.
pub fn split_genre_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// A song request queued for an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SongRequest {
    pub id: RequestId,
    pub event_id: EventId,
    pub song_id: SongId,
    pub requester_name: String,
    pub status: RequestStatus,
    pub play_order: i64,
    pub created_at: DateTime<Utc>,
}
