//! REST handlers for the catalog and the request queue

use super::{AppState, Caller};
use crate::error::{QueueError, Result};
use crate::queue::SongRow;
use axum::{
    extract::{
        rejection::{JsonRejection, StringRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use karaoke_common::db::{EventId, RequestId, RequestStatus, Song, SongId, SongRequest};
use serde::{Deserialize, Serialize};
use tracing::warn;

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SubmitRequestBody {
    pub song_id: SongId,
    pub requester_name: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateBody {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct ImportSongsBody {
    #[serde(default)]
    pub rows: Vec<SongRow>,
}

#[derive(Debug, Deserialize)]
pub struct ImportCsvParams {
    pub filename: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ImportResponse {
    pub status: String,
    pub count: usize,
}

impl ImportResponse {
    fn imported(count: usize) -> Self {
        Self {
            status: "Songs imported successfully".to_string(),
            count,
        }
    }
}

/// Body rejections surface as `MalformedInput` like every other bad input
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!("Rejected request body: {}", rejection.body_text());
            Err(QueueError::MalformedInput(rejection.body_text()))
        }
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// GET /karaoke/songs
pub async fn list_songs(State(state): State<AppState>) -> Result<Json<Vec<Song>>> {
    Ok(Json(state.service.list_songs().await?))
}

/// POST /karaoke/songs/import - JSON rows
pub async fn import_songs(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ImportSongsBody>, JsonRejection>,
) -> Result<Json<ImportResponse>> {
    let rows = body(payload)?.rows;
    let count = state.service.import_songs(rows).await?;
    Ok(Json(ImportResponse::imported(count)))
}

/// POST /karaoke/import?filename=songs.csv - raw CSV body
pub async fn import_csv(
    State(state): State<AppState>,
    Query(params): Query<ImportCsvParams>,
    content: std::result::Result<String, StringRejection>,
) -> Result<Json<ImportResponse>> {
    let content = content.map_err(|rejection| {
        warn!("Rejected CSV body: {}", rejection.body_text());
        QueueError::MalformedInput(rejection.body_text())
    })?;
    let filename = params.filename.unwrap_or_default();
    let count = state.service.import_csv(&filename, &content).await?;
    Ok(Json(ImportResponse::imported(count)))
}

// ============================================================================
// Requests
// ============================================================================

/// POST /karaoke/events/:event_id/requests
pub async fn submit_request(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
    payload: std::result::Result<Json<SubmitRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SongRequest>)> {
    let req = body(payload)?;
    let request = state
        .service
        .submit_request(event_id, req.song_id, &req.requester_name)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /karaoke/events/:event_id/requests - full history, any status
pub async fn list_requests(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<Json<Vec<SongRequest>>> {
    Ok(Json(state.service.list_requests(event_id).await?))
}

/// GET /karaoke/events/:event_id/queue - pending only
pub async fn list_queue(
    State(state): State<AppState>,
    Path(event_id): Path<EventId>,
) -> Result<Json<Vec<SongRequest>>> {
    Ok(Json(state.service.list_queue(event_id).await?))
}

/// PATCH /karaoke/requests/:request_id/status - operators only
pub async fn advance_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(request_id): Path<RequestId>,
    payload: std::result::Result<Json<StatusUpdateBody>, JsonRejection>,
) -> Result<Json<SongRequest>> {
    caller.require_operator()?;

    let new_status: RequestStatus = body(payload)?.status.parse()?;
    let request = state.service.advance_status(request_id, new_status).await?;
    Ok(Json(request))
}
