//! Reconciliation engine for postsync.
//!
//! Ties the document reader and the remote client together into one run:
//! changed files are created or updated by slug, then every remote post with
//! no local counterpart is delisted. Per-item failures are recorded in the
//! [`RunOutcome`] instead of aborting the run.

pub mod engine;
pub mod local;
pub mod outcome;
pub mod progress;
pub mod report;
pub mod sweep;

pub use engine::{SyncConfig, run_sync};
pub use local::{ChangedFile, LocalUniverse, select_changed};
pub use outcome::{
    DuplicateSlug, ItemOutcome, ItemResult, PlannedAction, RunOutcome, SkipReason, Subject,
    SweepStatus,
};
pub use progress::{ProgressReporter, SilentProgress};
pub use report::{RunReport, write_github_output};
