//! Queue change notifications
//!
//! Every queue-state change is described by a [`QueueEvent`]. The live hub
//! serializes each one to JSON once and fans it out to every subscriber of
//! the event; subscribers use it to refresh their view of the queue.

use crate::db::{EventId, RequestId, RequestStatus, SongRequest};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue change notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum QueueEvent {
    /// A new request was appended to the queue
    RequestAdded {
        event_id: EventId,
        request: SongRequest,
        timestamp: DateTime<Utc>,
    },

    /// A request moved along its lifecycle
    StatusChanged {
        event_id: EventId,
        request_id: RequestId,
        old_status: RequestStatus,
        new_status: RequestStatus,
        /// Record after the change
        request: SongRequest,
        timestamp: DateTime<Utc>,
    },
}

impl QueueEvent {
    pub fn request_added(request: SongRequest) -> Self {
        QueueEvent::RequestAdded {
            event_id: request.event_id,
            request,
            timestamp: Utc::now(),
        }
    }

    pub fn status_changed(old_status: RequestStatus, request: SongRequest) -> Self {
        QueueEvent::StatusChanged {
            event_id: request.event_id,
            request_id: request.id,
            old_status,
            new_status: request.status,
            request,
            timestamp: Utc::now(),
        }
    }

    /// Event whose subscribers receive this notification
    pub fn event_id(&self) -> EventId {
        match self {
            QueueEvent::RequestAdded { event_id, .. } => *event_id,
            QueueEvent::StatusChanged { event_id, .. } => *event_id,
        }
    }

    /// Notification name, used as the SSE event field
    pub fn event_type(&self) -> &'static str {
        match self {
            QueueEvent::RequestAdded { .. } => "RequestAdded",
            QueueEvent::StatusChanged { .. } => "StatusChanged",
        }
    }
}
