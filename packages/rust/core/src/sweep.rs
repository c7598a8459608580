//! Deletion sweep: delist every remote post with no local counterpart.

use tracing::{info, instrument, warn};

use postsync_remote::{DebugLog, RemoteClient};
use postsync_shared::{PublicationId, RemoteRecord};

use crate::local::LocalUniverse;
use crate::outcome::{ItemOutcome, ItemResult, PlannedAction, SkipReason, Subject, SweepStatus};
use crate::progress::ProgressReporter;

/// Remote records whose slug no local document claims, in listing order.
pub fn missing_records(
    records: Vec<RemoteRecord>,
    universe: &LocalUniverse,
) -> Vec<RemoteRecord> {
    records
        .into_iter()
        .filter(|record| !universe.contains(&record.slug))
        .collect()
}

/// List the publication and delist what is missing locally.
///
/// A failed listing ends the sweep with [`SweepStatus::ListingFailed`] and no
/// items; a failed delist is recorded and the sweep moves on.
#[instrument(skip_all, fields(publication = %publication))]
pub async fn sweep(
    client: &RemoteClient,
    log: &mut DebugLog,
    publication: &PublicationId,
    universe: &LocalUniverse,
    dry_run: bool,
    progress: &dyn ProgressReporter,
) -> (Vec<ItemOutcome>, SweepStatus) {
    let records = match client.list_all(log, publication).await {
        Ok(records) => records,
        Err(failure) => {
            warn!(error = %failure, "remote listing failed; nothing delisted");
            return (Vec::new(), SweepStatus::ListingFailed { failure });
        }
    };
    let listed = records.len();

    let missing = missing_records(records, universe);
    info!(listed, missing = missing.len(), "compared remote listing");
    if !missing.is_empty() && !universe.unresolved().is_empty() {
        warn!(
            unresolved = universe.unresolved().len(),
            "local files without a slug cannot protect their remote posts"
        );
    }

    let total = missing.len();
    let mut items = Vec::with_capacity(total);
    for (index, record) in missing.into_iter().enumerate() {
        let result = if dry_run {
            ItemResult::Planned(PlannedAction::Delist {
                id: record.id.clone(),
            })
        } else {
            match client.delist(log, &record.id).await {
                Ok(true) => {
                    info!(slug = %record.slug, id = %record.id, "delisted");
                    ItemResult::Delisted
                }
                Ok(false) => {
                    warn!(slug = %record.slug, "delist not confirmed");
                    ItemResult::Skipped(SkipReason::NotDelisted)
                }
                Err(failure) => {
                    warn!(slug = %record.slug, error = %failure, "delist failed");
                    ItemResult::Skipped(SkipReason::Remote { failure })
                }
            }
        };

        progress.item_done(&record.slug, index + 1, total);
        items.push(ItemOutcome {
            subject: Subject::Remote(record),
            change: None,
            result,
        });
    }

    (items, SweepStatus::Completed { listed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use postsync_shared::Slug;

    fn record(id: &str, slug: &str) -> RemoteRecord {
        RemoteRecord {
            id: id.into(),
            slug: slug.into(),
        }
    }

    #[test]
    fn only_unclaimed_records_are_missing() {
        let universe = LocalUniverse::from_entries([
            (Slug::normalize("a"), "posts/a.md"),
            (Slug::normalize("b"), "posts/b.md"),
        ]);
        let remote = vec![
            record("1", "a"),
            record("3", "c"),
            record("2", "b"),
            record("4", "d"),
        ];

        let missing = missing_records(remote, &universe);
        assert_eq!(missing, vec![record("3", "c"), record("4", "d")]);
    }

    #[test]
    fn empty_local_tree_misses_everything() {
        let missing = missing_records(vec![record("1", "a")], &LocalUniverse::default());
        assert_eq!(missing.len(), 1);
    }
}
