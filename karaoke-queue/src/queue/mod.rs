//! Queue ordering, catalog import and the service tying them together

pub mod import;
pub mod ordering;
pub mod service;

pub use import::SongRow;
pub use ordering::{EventLocks, QueueOrdering};
pub use service::QueueService;
