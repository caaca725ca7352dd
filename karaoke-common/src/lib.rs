//! # Karaoke Common Library
//!
//! Shared code for the karaoke queue services including:
//! - Database initialization and schema
//! - Persistent models (songs, song requests, request status)
//! - Queue change notifications (QueueEvent enum)
//! - Bootstrap configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod events;

pub use error::{Error, Result};
