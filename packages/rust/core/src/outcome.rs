//! Per-item results of a run.

use std::path::PathBuf;

use serde::Serialize;

use postsync_remote::DebugLog;
use postsync_shared::{ChangeKind, PublicationId, RemoteFailure, RemoteRecord, ValidationError};

/// Two or more local files that normalize to the same slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSlug {
    pub slug: String,
    pub paths: Vec<PathBuf>,
}

/// What an outcome is about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Subject {
    /// A changed local file. Slug and title are known once it validated.
    File {
        path: PathBuf,
        slug: Option<String>,
        title: Option<String>,
    },
    /// A remote record found by the deletion sweep.
    Remote(RemoteRecord),
}

impl Subject {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            slug: None,
            title: None,
        }
    }

    /// Short label for logs and progress output.
    pub fn label(&self) -> String {
        match self {
            Self::File { path, .. } => path.display().to_string(),
            Self::Remote(record) => record.slug.clone(),
        }
    }
}

/// A write the run would have issued, reported by dry runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    Create,
    Update { id: String },
    Delist { id: String },
}

/// Why an item did not reach a successful terminal state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    Validation { error: ValidationError },
    Unreadable { message: String },
    DuplicateSlug { slug: String, paths: Vec<PathBuf> },
    Remote { failure: RemoteFailure },
    /// The delist call succeeded but the remote reports the post still listed.
    NotDelisted,
    /// The worker task did not complete.
    Internal { message: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation { error } => write!(f, "{error}"),
            Self::Unreadable { message } => write!(f, "unreadable: {message}"),
            Self::DuplicateSlug { slug, paths } => {
                let paths: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
                write!(f, "slug `{slug}` is shared by {}", paths.join(", "))
            }
            Self::Remote { failure } => write!(f, "{failure}"),
            Self::NotDelisted => f.write_str("remote did not confirm the delist"),
            Self::Internal { message } => write!(f, "internal error: {message}"),
        }
    }
}

/// Terminal state of one item.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum ItemResult {
    Created(RemoteRecord),
    Updated(RemoteRecord),
    Delisted,
    Planned(PlannedAction),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub subject: Subject,
    /// Classification of the input file; `None` for sweep items.
    pub change: Option<ChangeKind>,
    pub result: ItemResult,
}

impl ItemOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self.result, ItemResult::Skipped(_))
    }
}

/// How the deletion sweep ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepStatus {
    /// The full listing was read; `listed` records were compared.
    Completed { listed: usize },
    /// Turned off by configuration.
    Disabled,
    /// The listing itself failed, so nothing was delisted.
    ListingFailed { failure: RemoteFailure },
}

/// Everything one run produced, in order: per-file items, then sweep items.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub publication: PublicationId,
    pub dry_run: bool,
    pub input_added_files: Vec<PathBuf>,
    pub input_changed_files: Vec<PathBuf>,
    pub items: Vec<ItemOutcome>,
    pub sweep: SweepStatus,
    pub duplicates: Vec<DuplicateSlug>,
    pub debug: DebugLog,
}

impl RunOutcome {
    pub fn skipped(&self) -> usize {
        self.items.iter().filter(|item| item.is_skipped()).count()
    }

    /// Whether any item was skipped or the sweep could not list.
    pub fn has_errors(&self) -> bool {
        self.skipped() > 0 || matches!(self.sweep, SweepStatus::ListingFailed { .. })
    }
}
