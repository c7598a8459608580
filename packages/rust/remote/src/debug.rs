//! Append-only trail of remote calls, carried into the run report.
//!
//! Each log is owned by whoever makes the calls; concurrent tasks keep their
//! own and the engine merges them at its join point.

use chrono::Utc;
use serde::Serialize;

use postsync_shared::DebugEntry;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DebugLog {
    entries: Vec<DebugEntry>,
}

impl DebugLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a call description stamped with the current UTC time.
    pub fn record(&mut self, description: impl Into<String>) {
        self.entries.push(DebugEntry {
            timestamp: Utc::now(),
            description: description.into(),
        });
    }

    /// Append another log's entries after this one's.
    pub fn merge(&mut self, other: DebugLog) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[DebugEntry] {
        &self.entries
    }
}
