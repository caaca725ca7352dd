//! Live fan-out hub
//!
//! Best-effort real-time notifications. Delivery is not acknowledged and
//! missed messages are never replayed.

pub mod registry;

pub use registry::{
    BroadcastReport, ConnectionId, ConnectionState, HubMessage, LiveHub, PendingSubscription,
    Subscription,
};
