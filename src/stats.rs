//! Feed-health counters.
//!
//! Counts what the decoder saw: frames, containers per kind, elements dropped
//! by fail-soft batches, and frames rejected outright. Counters are atomic so
//! a shared `FeedStats` can be fed from several decode tasks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::protocol::container::ContentContainer;
use crate::protocol::errors::DecodeError;
use crate::protocol::notification::NotificationType;

#[derive(Debug, Default)]
pub struct FeedStats {
    frames: AtomicU64,
    containers: AtomicU64,
    dropped: AtomicU64,
    unknown: AtomicU64,
    malformed: AtomicU64,
    protocol_violations: AtomicU64,
    by_kind: Mutex<BTreeMap<&'static str, u64>>,
}

/// Point-in-time copy of [`FeedStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedStatsSnapshot {
    pub frames: u64,
    pub containers: u64,
    pub dropped: u64,
    pub unknown: u64,
    pub malformed: u64,
    pub protocol_violations: u64,
    pub by_kind: BTreeMap<&'static str, u64>,
}

impl FeedStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successfully decoded notification.
    pub fn record(&self, notification: &NotificationType) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        match notification {
            NotificationType::ContentChanges { contents, dropped } => {
                self.dropped.fetch_add(*dropped as u64, Ordering::Relaxed);
                for container in contents {
                    self.record_container(container);
                }
            }
            NotificationType::ListeningStarted { .. } => self.bump_kind("listeningStarted"),
            NotificationType::Unknown => self.bump_kind("unknownNotification"),
        }
    }

    fn record_container(&self, container: &ContentContainer) {
        self.containers.fetch_add(1, Ordering::Relaxed);
        if container.is_unknown() {
            self.unknown.fetch_add(1, Ordering::Relaxed);
        }
        self.bump_kind(container.kind());
    }

    /// Record a frame that failed to decode as a whole.
    pub fn record_error(&self, error: &DecodeError) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        if error.is_protocol_violation() {
            self.protocol_violations.fetch_add(1, Ordering::Relaxed);
        } else {
            self.malformed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn bump_kind(&self, kind: &'static str) {
        let mut by_kind = self.by_kind.lock().unwrap_or_else(PoisonError::into_inner);
        *by_kind.entry(kind).or_insert(0) += 1;
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> FeedStatsSnapshot {
        FeedStatsSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            containers: self.containers.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            protocol_violations: self.protocol_violations.load(Ordering::Relaxed),
            by_kind: self
                .by_kind
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
        }
    }
}

impl FeedStatsSnapshot {
    /// Share of decoded-or-dropped containers that were dropped.
    pub fn drop_rate(&self) -> f64 {
        let seen = self.containers + self.dropped;
        if seen == 0 {
            0.0
        } else {
            self.dropped as f64 / seen as f64
        }
    }
}
