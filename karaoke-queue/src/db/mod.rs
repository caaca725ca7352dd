//! Database access layer
//!
//! Catalog lookups and the song request store.

pub mod requests;
pub mod songs;
