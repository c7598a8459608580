//! Progress callbacks for interactive front ends.

use crate::outcome::RunOutcome;

/// Progress callback for reporting sync status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when one item (a changed file or a delist) finishes.
    fn item_done(&self, label: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, outcome: &RunOutcome);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn item_done(&self, _label: &str, _current: usize, _total: usize) {}
    fn done(&self, _outcome: &RunOutcome) {}
}
