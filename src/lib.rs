//! Library entrypoint for live-content-feed.
//!
//! Exposes all modules so integration tests can import them.

pub mod config;
pub mod data;
pub mod protocol;
pub mod stats;
