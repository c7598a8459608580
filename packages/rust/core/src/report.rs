//! Rendering a [`RunOutcome`] for people and for CI.
//!
//! The JSON form uses the top-level keys workflow steps read from
//! `result_json` (`added`, `modified`, `errors`, ...).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use postsync_shared::{ChangeKind, DebugEntry, PostsyncError, RemoteRecord, Result};

use crate::outcome::{
    DuplicateSlug, ItemOutcome, ItemResult, PlannedAction, RunOutcome, SkipReason, Subject,
    SweepStatus,
};

/// Heredoc delimiter for the multi-line summary in `GITHUB_OUTPUT`.
const SUMMARY_DELIMITER: &str = "POSTSYNC_SUMMARY_EOF";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub slug: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedEntry {
    pub subject: String,
    #[serde(flatten)]
    pub action: PlannedAction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEntry {
    /// File path, remote slug, or `remote listing`.
    pub subject: String,
    pub message: String,
    pub detail: SkipReason,
}

/// Serializable summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub input_added_files: Vec<String>,
    pub input_changed_files: Vec<String>,
    pub added: Vec<PostEntry>,
    pub modified: Vec<PostEntry>,
    pub delisted: Vec<PostEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned: Vec<PlannedEntry>,
    pub errors: Vec<ErrorEntry>,
    pub sweep: SweepStatus,
    pub duplicate_slugs: Vec<DuplicateSlug>,
    pub debug: Vec<DebugEntry>,
}

impl RunReport {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let mut report = Self {
            dry_run: outcome.dry_run,
            input_added_files: display_paths(&outcome.input_added_files),
            input_changed_files: display_paths(&outcome.input_changed_files),
            added: Vec::new(),
            modified: Vec::new(),
            delisted: Vec::new(),
            planned: Vec::new(),
            errors: Vec::new(),
            sweep: outcome.sweep.clone(),
            duplicate_slugs: outcome.duplicates.clone(),
            debug: outcome.debug.entries().to_vec(),
        };

        for item in &outcome.items {
            report.push_item(item);
        }

        if let SweepStatus::ListingFailed { failure } = &outcome.sweep {
            report.errors.push(ErrorEntry {
                subject: "remote listing".to_string(),
                message: failure.to_string(),
                detail: SkipReason::Remote {
                    failure: failure.clone(),
                },
            });
        }

        report
    }

    fn push_item(&mut self, item: &ItemOutcome) {
        match &item.result {
            ItemResult::Created(record) | ItemResult::Updated(record) => {
                let bucket = item.change.unwrap_or(match item.result {
                    ItemResult::Created(_) => ChangeKind::Added,
                    _ => ChangeKind::Modified,
                });
                let entry = post_entry(&item.subject, record);
                match bucket {
                    ChangeKind::Added => self.added.push(entry),
                    ChangeKind::Modified => self.modified.push(entry),
                }
            }
            ItemResult::Delisted => {
                if let Subject::Remote(record) = &item.subject {
                    self.delisted.push(PostEntry {
                        title: None,
                        slug: record.slug.clone(),
                        id: record.id.clone(),
                        path: None,
                    });
                }
            }
            ItemResult::Planned(action) => self.planned.push(PlannedEntry {
                subject: item.subject.label(),
                action: action.clone(),
            }),
            ItemResult::Skipped(reason) => self.errors.push(ErrorEntry {
                subject: item.subject.label(),
                message: reason.to_string(),
                detail: reason.clone(),
            }),
        }
    }

    /// Single-line JSON, as written to `result_json`.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| PostsyncError::parse(format!("failed to serialize run report: {e}")))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PostsyncError::parse(format!("failed to serialize run report: {e}")))
    }

    /// Human-readable summary. Empty sections are omitted.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        push_bucket(&mut out, "Added", &self.added);
        push_bucket(&mut out, "Modified", &self.modified);
        push_bucket(&mut out, "Delisted", &self.delisted);

        if !self.planned.is_empty() {
            out.push_str("Planned changes:\n");
            for entry in &self.planned {
                let line = match &entry.action {
                    PlannedAction::Create => format!("  - create {}\n", entry.subject),
                    PlannedAction::Update { id } => {
                        format!("  - update {} ({id})\n", entry.subject)
                    }
                    PlannedAction::Delist { id } => {
                        format!("  - delist {} ({id})\n", entry.subject)
                    }
                };
                out.push_str(&line);
            }
        }

        if !self.errors.is_empty() {
            out.push_str("Errors:\n");
            for error in &self.errors {
                out.push_str(&format!("  - {}: {}\n", error.subject, error.message));
            }
        }
        out
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Append `result_json` and `result_summary` to a GitHub Actions output file.
pub fn write_github_output(path: &Path, report: &RunReport) -> Result<()> {
    let json = report.to_json()?;
    let summary = report.summary();

    let mut content = format!("result_json={json}\nresult_summary<<{SUMMARY_DELIMITER}\n{summary}");
    if !summary.is_empty() && !summary.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(SUMMARY_DELIMITER);
    content.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| PostsyncError::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| PostsyncError::io(path, e))?;

    debug!(path = %path.display(), bytes = content.len(), "wrote GitHub output");
    Ok(())
}

fn post_entry(subject: &Subject, record: &RemoteRecord) -> PostEntry {
    match subject {
        Subject::File { path, title, .. } => PostEntry {
            title: title.clone(),
            slug: record.slug.clone(),
            id: record.id.clone(),
            path: Some(path.display().to_string()),
        },
        Subject::Remote(_) => PostEntry {
            title: None,
            slug: record.slug.clone(),
            id: record.id.clone(),
            path: None,
        },
    }
}

fn push_bucket(out: &mut String, label: &str, entries: &[PostEntry]) {
    if entries.is_empty() {
        return;
    }
    out.push_str(&format!("{label} posts:\n"));
    for entry in entries {
        match &entry.title {
            Some(title) => out.push_str(&format!("  - {title} ({})\n", entry.slug)),
            None => out.push_str(&format!("  - {}\n", entry.slug)),
        }
    }
}

fn display_paths(paths: &[std::path::PathBuf]) -> Vec<String> {
    paths.iter().map(|p| p.display().to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use postsync_remote::DebugLog;
    use postsync_shared::{PublicationId, RemoteFailure, ValidationError};
    use std::path::PathBuf;

    fn file(path: &str, slug: &str, title: &str) -> Subject {
        Subject::File {
            path: PathBuf::from(path),
            slug: Some(slug.into()),
            title: Some(title.into()),
        }
    }

    fn record(id: &str, slug: &str) -> RemoteRecord {
        RemoteRecord {
            id: id.into(),
            slug: slug.into(),
        }
    }

    fn outcome(items: Vec<ItemOutcome>, sweep: SweepStatus) -> RunOutcome {
        let mut debug = DebugLog::new();
        debug.record("Publication ID: pub-1");
        RunOutcome {
            publication: PublicationId("pub-1".into()),
            dry_run: false,
            input_added_files: vec![PathBuf::from("posts/new.md")],
            input_changed_files: vec![PathBuf::from("posts/old.md")],
            items,
            sweep,
            duplicates: Vec::new(),
            debug,
        }
    }

    fn sample() -> RunOutcome {
        outcome(
            vec![
                ItemOutcome {
                    subject: file("posts/new.md", "new-post", "New Post"),
                    change: Some(ChangeKind::Added),
                    result: ItemResult::Created(record("1", "new-post")),
                },
                ItemOutcome {
                    subject: file("posts/old.md", "old-post", "Old Post"),
                    change: Some(ChangeKind::Modified),
                    result: ItemResult::Updated(record("2", "old-post")),
                },
                ItemOutcome {
                    subject: Subject::file("posts/bad.md"),
                    change: Some(ChangeKind::Modified),
                    result: ItemResult::Skipped(SkipReason::Validation {
                        error: ValidationError::missing("title"),
                    }),
                },
                ItemOutcome {
                    subject: Subject::Remote(record("3", "gone")),
                    change: None,
                    result: ItemResult::Delisted,
                },
            ],
            SweepStatus::Completed { listed: 3 },
        )
    }

    #[test]
    fn buckets_follow_input_classification() {
        let mut out = sample();
        // Added file that turned out to exist remotely still reports as added.
        out.items[0].result = ItemResult::Updated(record("1", "new-post"));
        let report = RunReport::from_outcome(&out);

        assert_eq!(report.added.len(), 1);
        assert_eq!(report.added[0].title.as_deref(), Some("New Post"));
        assert_eq!(report.modified.len(), 1);
        assert_eq!(report.delisted[0].slug, "gone");
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].subject, "posts/bad.md");
        assert!(report.has_errors());
    }

    #[test]
    fn summary_format() {
        let report = RunReport::from_outcome(&sample());
        assert_eq!(
            report.summary(),
            "Added posts:\n  - New Post (new-post)\n\
             Modified posts:\n  - Old Post (old-post)\n\
             Delisted posts:\n  - gone\n\
             Errors:\n  - posts/bad.md: missing required front matter field: title\n"
        );
    }

    #[test]
    fn json_has_expected_keys() {
        let report = RunReport::from_outcome(&sample());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        for key in [
            "input_added_files",
            "input_changed_files",
            "added",
            "modified",
            "delisted",
            "errors",
            "duplicate_slugs",
            "debug",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
        assert!(value.get("planned").is_none());
        assert_eq!(value["input_added_files"][0], "posts/new.md");
        assert_eq!(value["errors"][0]["detail"]["reason"], "validation");
        assert_eq!(value["sweep"]["status"], "completed");
    }

    #[test]
    fn listing_failure_is_reported_as_error() {
        let failure = RemoteFailure::response(503, "HTTP 503 Service Unavailable", "");
        let report = RunReport::from_outcome(&outcome(
            Vec::new(),
            SweepStatus::ListingFailed { failure },
        ));
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].subject, "remote listing");
        assert!(
            report
                .summary()
                .starts_with("Errors:\n  - remote listing: remote failure (HTTP 503)")
        );
    }

    #[test]
    fn empty_run_has_empty_summary() {
        let report = RunReport::from_outcome(&outcome(Vec::new(), SweepStatus::Disabled));
        assert_eq!(report.summary(), "");
        assert!(!report.has_errors());
    }

    #[test]
    fn github_output_appends_json_and_heredoc_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        std::fs::write(&path, "existing=1\n").unwrap();

        let report = RunReport::from_outcome(&sample());
        write_github_output(&path, &report).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("existing=1"));
        let json_line = lines.next().unwrap();
        assert!(json_line.starts_with("result_json={"));
        assert!(!json_line.contains('\n'));
        assert_eq!(lines.next(), Some("result_summary<<POSTSYNC_SUMMARY_EOF"));
        assert_eq!(lines.next(), Some("Added posts:"));
        assert!(content.ends_with(
            "  - posts/bad.md: missing required front matter field: title\n\
             POSTSYNC_SUMMARY_EOF\n"
        ));
    }
}
