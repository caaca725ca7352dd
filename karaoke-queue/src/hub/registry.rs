//! Per-event subscriber registry and fan-out
//!
//! Connection lifecycle: `Connecting -> Open -> Closed`.
//!
//! - A [`PendingSubscription`] is `Connecting`: it has an id but is not
//!   registered, so it receives nothing.
//! - [`PendingSubscription::open`] registers it under its event id and
//!   yields an `Open` [`Subscription`].
//! - The subscription is `Closed` once it leaves the registry: dropped by
//!   its owner (any path, including unwinding), dropped by the hub after a
//!   failed send, or cleared at shutdown.
//!
//! One mutex guards the whole `event id -> connections` map. Register,
//! deregister and broadcast all take it, and broadcast never awaits while
//! holding it: each connection has a bounded outbox and delivery is a
//! non-blocking `try_send`. A full outbox (hung client) or a closed one is
//! a send failure and removes that connection only.

use karaoke_common::db::EventId;
use karaoke_common::events::QueueEvent;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub type ConnectionId = Uuid;

/// Serialized notification shared by every outbox it is delivered to
///
/// Carries the notification type next to the JSON so transports that name
/// their frames (SSE) never parse the payload back.
#[derive(Debug, Clone)]
pub struct HubMessage {
    event_type: &'static str,
    payload: Arc<str>,
}

impl HubMessage {
    pub fn new(event_type: &'static str, payload: impl Into<Arc<str>>) -> Self {
        Self {
            event_type,
            payload: payload.into(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// JSON body of the notification
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl Deref for HubMessage {
    type Target = str;

    fn deref(&self) -> &str {
        &self.payload
    }
}

type Buckets = HashMap<EventId, HashMap<ConnectionId, mpsc::Sender<HubMessage>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
}

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the message was queued for
    pub delivered: usize,
    /// Connections deregistered because the send failed
    pub dropped: usize,
}

struct HubInner {
    buckets: Mutex<Buckets>,
    outbox_capacity: usize,
}

impl HubInner {
    fn buckets(&self) -> MutexGuard<'_, Buckets> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn deregister(&self, event_id: EventId, connection_id: ConnectionId) -> bool {
        let mut buckets = self.buckets();
        let removed = match buckets.get_mut(&event_id) {
            Some(bucket) => {
                let removed = bucket.remove(&connection_id).is_some();
                if bucket.is_empty() {
                    buckets.remove(&event_id);
                }
                removed
            }
            None => false,
        };

        if removed {
            debug!(event_id, %connection_id, "Subscriber deregistered");
        }
        removed
    }

    fn is_registered(&self, event_id: EventId, connection_id: ConnectionId) -> bool {
        self.buckets()
            .get(&event_id)
            .is_some_and(|bucket| bucket.contains_key(&connection_id))
    }
}

/// Live fan-out hub
///
/// Cheap to clone; all clones share one registry.
#[derive(Clone)]
pub struct LiveHub {
    inner: Arc<HubInner>,
}

impl LiveHub {
    /// Create a hub whose subscribers may each hold `outbox_capacity`
    /// undelivered messages before being dropped as hung
    pub fn new(outbox_capacity: usize) -> Self {
        let outbox_capacity = outbox_capacity.max(1);
        info!("Live hub initialized with outbox capacity {}", outbox_capacity);
        Self {
            inner: Arc::new(HubInner {
                buckets: Mutex::new(HashMap::new()),
                outbox_capacity,
            }),
        }
    }

    /// Start a connection for `event_id` (state `Connecting`)
    pub fn connect(&self, event_id: EventId) -> PendingSubscription {
        PendingSubscription {
            id: Uuid::new_v4(),
            event_id,
            hub: Arc::clone(&self.inner),
        }
    }

    /// Connect and open in one step
    pub fn subscribe(&self, event_id: EventId) -> Subscription {
        self.connect(event_id).open()
    }

    /// Serialize `event` once and deliver it to every subscriber of its event
    pub fn broadcast(&self, event: &QueueEvent) -> BroadcastReport {
        match serde_json::to_string(event) {
            Ok(json) => {
                self.broadcast_text(event.event_id(), HubMessage::new(event.event_type(), json))
            }
            Err(e) => {
                warn!("Failed to serialize queue event: {}", e);
                BroadcastReport::default()
            }
        }
    }

    /// Deliver a pre-serialized message to every subscriber of `event_id`
    pub fn broadcast_text(&self, event_id: EventId, message: HubMessage) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut buckets = self.inner.buckets();

        let Some(bucket) = buckets.get_mut(&event_id) else {
            debug!(event_id, "Broadcast with no subscribers");
            return report;
        };

        bucket.retain(|connection_id, outbox| match outbox.try_send(message.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                warn!(event_id, %connection_id, "Subscriber outbox full, closing connection");
                report.dropped += 1;
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(event_id, %connection_id, "Subscriber already gone");
                report.dropped += 1;
                false
            }
        });

        if bucket.is_empty() {
            buckets.remove(&event_id);
        }

        debug!(
            event_id,
            delivered = report.delivered,
            dropped = report.dropped,
            "Broadcast complete"
        );
        report
    }

    /// Open connections for one event
    pub fn connection_count(&self, event_id: EventId) -> usize {
        self.inner.buckets().get(&event_id).map_or(0, HashMap::len)
    }

    /// Open connections across all events
    pub fn total_connections(&self) -> usize {
        self.inner.buckets().values().map(HashMap::len).sum()
    }

    /// Close every connection (server shutdown)
    ///
    /// Outboxes are dropped, so each subscriber drains what it already has
    /// and then sees end-of-stream.
    pub fn close_all(&self) -> usize {
        let mut buckets = self.inner.buckets();
        let closed = buckets.values().map(HashMap::len).sum();
        buckets.clear();
        info!("Live hub closed {} connections", closed);
        closed
    }
}

/// Connection that has not completed its handshake
pub struct PendingSubscription {
    id: ConnectionId,
    event_id: EventId,
    hub: Arc<HubInner>,
}

impl PendingSubscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::Connecting
    }

    /// Handshake succeeded: register under the event id
    pub fn open(self) -> Subscription {
        let (tx, rx) = mpsc::channel(self.hub.outbox_capacity);

        self.hub
            .buckets()
            .entry(self.event_id)
            .or_default()
            .insert(self.id, tx);

        debug!(event_id = self.event_id, connection_id = %self.id, "Subscriber registered");

        Subscription {
            id: self.id,
            event_id: self.event_id,
            rx,
            hub: Arc::downgrade(&self.hub),
        }
    }
}

/// Open subscriber connection
///
/// Owns its registry entry: dropping the subscription deregisters it.
pub struct Subscription {
    id: ConnectionId,
    event_id: EventId,
    rx: mpsc::Receiver<HubMessage>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    /// Next notification; `None` once the hub has closed this connection
    /// and the outbox is drained
    pub async fn recv(&mut self) -> Option<HubMessage> {
        self.rx.recv().await
    }

    /// Non-blocking variant of [`Subscription::recv`]
    pub fn try_recv(&mut self) -> Option<HubMessage> {
        self.rx.try_recv().ok()
    }

    pub fn state(&self) -> ConnectionState {
        match self.hub.upgrade() {
            Some(hub) if hub.is_registered(self.event_id, self.id) => ConnectionState::Open,
            _ => ConnectionState::Closed,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.deregister(self.event_id, self.id);
        }
    }
}
