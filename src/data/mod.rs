//! Domain model and live-score decoding.

pub mod live_data;
pub mod models;
pub mod wire;
