//! The reconciliation run: submit changed files, then sweep the remote.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, instrument, warn};

use postsync_markdown::{ResourceResolver, load_document};
use postsync_remote::{DebugLog, PostMutation, RemoteClient};
use postsync_shared::{PostsyncError, PublicationId, Result};

use crate::local::{ChangedFile, LocalUniverse, select_changed};
use crate::outcome::{
    ItemOutcome, ItemResult, PlannedAction, RunOutcome, SkipReason, Subject, SweepStatus,
};
use crate::progress::ProgressReporter;
use crate::sweep;

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Root of the local documents. Empty means the current directory.
    pub posts_directory: PathBuf,
    pub added_files: Vec<PathBuf>,
    pub changed_files: Vec<PathBuf>,
    pub publication_host: String,
    /// Files processed at once. `1` is strictly sequential.
    pub concurrency: usize,
    /// Run the deletion sweep after the per-file phase.
    pub delist_missing: bool,
    /// Look everything up but issue no writes.
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            posts_directory: PathBuf::new(),
            added_files: Vec::new(),
            changed_files: Vec::new(),
            publication_host: String::new(),
            concurrency: 1,
            delist_missing: true,
            dry_run: false,
        }
    }
}

/// State shared by every per-file task.
struct FileContext {
    client: Arc<RemoteClient>,
    resolver: Arc<dyn ResourceResolver>,
    publication: PublicationId,
    universe: Arc<LocalUniverse>,
    dry_run: bool,
}

/// Run a full reconciliation.
///
/// 1. Resolve the publication (fatal on failure)
/// 2. Scan the local tree for slugs and duplicates
/// 3. Create or update each changed file
/// 4. Delist remote posts missing locally
///
/// Per-item failures never abort the run; they are recorded as skipped.
#[instrument(skip_all, fields(host = %config.publication_host, dry_run = config.dry_run))]
pub async fn run_sync(
    config: &SyncConfig,
    client: Arc<RemoteClient>,
    resolver: Arc<dyn ResourceResolver>,
    progress: &dyn ProgressReporter,
) -> Result<RunOutcome> {
    let start = Instant::now();
    let mut debug = DebugLog::new();

    // --- Phase 1: Publication ---
    progress.phase("Resolving publication");
    let publication = client
        .resolve_publication(&mut debug, &config.publication_host)
        .await
        .map_err(|e| {
            PostsyncError::config(format!(
                "cannot resolve publication for host {}: {e}",
                config.publication_host
            ))
        })?;

    // --- Phase 2: Local tree ---
    progress.phase("Scanning local documents");
    let universe = Arc::new(LocalUniverse::scan(&config.posts_directory)?);
    let duplicates = universe.duplicates();
    for dup in &duplicates {
        warn!(slug = %dup.slug, files = dup.paths.len(), "duplicate slug in local documents");
    }

    // --- Phase 3: Changed files ---
    let files = select_changed(
        &config.posts_directory,
        &config.added_files,
        &config.changed_files,
    );
    progress.phase("Syncing changed documents");
    info!(files = files.len(), concurrency = config.concurrency, "processing changed files");

    let ctx = Arc::new(FileContext {
        client: Arc::clone(&client),
        resolver,
        publication: publication.clone(),
        universe: Arc::clone(&universe),
        dry_run: config.dry_run,
    });

    let results = if config.concurrency <= 1 {
        process_sequential(&ctx, files, progress).await
    } else {
        process_concurrent(&ctx, files, config.concurrency, progress).await
    };

    let mut items = Vec::with_capacity(results.len());
    for (item, log) in results {
        debug.merge(log);
        items.push(item);
    }

    // --- Phase 4: Sweep ---
    let sweep_status = if config.delist_missing {
        progress.phase("Delisting removed documents");
        let (swept, status) = sweep::sweep(
            &client,
            &mut debug,
            &publication,
            &universe,
            config.dry_run,
            progress,
        )
        .await;
        items.extend(swept);
        status
    } else {
        info!("deletion sweep disabled");
        SweepStatus::Disabled
    };

    let outcome = RunOutcome {
        publication,
        dry_run: config.dry_run,
        input_added_files: config.added_files.clone(),
        input_changed_files: config.changed_files.clone(),
        items,
        sweep: sweep_status,
        duplicates,
        debug,
    };

    info!(
        items = outcome.items.len(),
        skipped = outcome.skipped(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "sync complete"
    );
    progress.done(&outcome);
    Ok(outcome)
}

async fn process_sequential(
    ctx: &FileContext,
    files: Vec<ChangedFile>,
    progress: &dyn ProgressReporter,
) -> Vec<(ItemOutcome, DebugLog)> {
    let total = files.len();
    let mut results = Vec::with_capacity(total);
    for (index, file) in files.into_iter().enumerate() {
        let result = process_file(ctx, file).await;
        progress.item_done(&result.0.subject.label(), index + 1, total);
        results.push(result);
    }
    results
}

/// Bounded worker pool. Each task owns its outcome and debug log; results
/// are collected in input order.
async fn process_concurrent(
    ctx: &Arc<FileContext>,
    files: Vec<ChangedFile>,
    concurrency: usize,
    progress: &dyn ProgressReporter,
) -> Vec<(ItemOutcome, DebugLog)> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let total = files.len();

    let mut handles = Vec::with_capacity(total);
    for file in files {
        let ctx = Arc::clone(ctx);
        let sem = Arc::clone(&semaphore);
        let fallback = file.clone();
        handles.push((
            fallback,
            tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                process_file(&ctx, file).await
            }),
        ));
    }

    let mut results = Vec::with_capacity(total);
    for (index, (file, handle)) in handles.into_iter().enumerate() {
        let result = match handle.await {
            Ok(result) => result,
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "worker task failed");
                let item = ItemOutcome {
                    subject: Subject::file(&file.path),
                    change: Some(file.change),
                    result: ItemResult::Skipped(SkipReason::Internal {
                        message: e.to_string(),
                    }),
                };
                (item, DebugLog::new())
            }
        };
        progress.item_done(&result.0.subject.label(), index + 1, total);
        results.push(result);
    }
    results
}

/// Drive one changed file to a terminal state.
#[instrument(skip_all, fields(path = %file.path.display()))]
async fn process_file(ctx: &FileContext, file: ChangedFile) -> (ItemOutcome, DebugLog) {
    let mut log = DebugLog::new();
    let ChangedFile { path, change } = file;

    let skipped = |subject: Subject, reason: SkipReason| ItemOutcome {
        subject,
        change: Some(change),
        result: ItemResult::Skipped(reason),
    };

    let doc = match load_document(&path, ctx.resolver.as_ref()) {
        Ok(doc) => doc,
        Err(PostsyncError::Validation(error)) => {
            warn!(error = %error, "invalid document");
            return (skipped(Subject::file(&path), SkipReason::Validation { error }), log);
        }
        Err(e) => {
            warn!(error = %e, "unreadable document");
            let reason = SkipReason::Unreadable {
                message: e.to_string(),
            };
            return (skipped(Subject::file(&path), reason), log);
        }
    };

    let subject = Subject::File {
        path: path.clone(),
        slug: Some(doc.slug.to_string()),
        title: Some(doc.title.clone()),
    };

    if let Some(paths) = ctx.universe.duplicate_paths(doc.slug.as_str()) {
        warn!(slug = %doc.slug, "slug shared with other files; not submitting");
        let reason = SkipReason::DuplicateSlug {
            slug: doc.slug.to_string(),
            paths: paths.to_vec(),
        };
        return (skipped(subject, reason), log);
    }

    let existing = match ctx
        .client
        .find_by_slug(&mut log, &ctx.publication, doc.slug.as_str())
        .await
    {
        Ok(existing) => existing,
        Err(failure) => {
            warn!(error = %failure, "slug lookup failed");
            return (skipped(subject, SkipReason::Remote { failure }), log);
        }
    };

    let mutation = PostMutation::for_document(&doc, &ctx.publication, existing);

    if ctx.dry_run {
        let planned = match &mutation {
            PostMutation::Create(_) => PlannedAction::Create,
            PostMutation::Update(input) => PlannedAction::Update {
                id: input.id.clone(),
            },
        };
        info!(slug = %doc.slug, ?planned, "dry run");
        let item = ItemOutcome {
            subject,
            change: Some(change),
            result: ItemResult::Planned(planned),
        };
        return (item, log);
    }

    let result = match ctx.client.submit(&mut log, &mutation).await {
        Ok(record) if mutation.is_create() => {
            info!(slug = %record.slug, id = %record.id, "created");
            ItemResult::Created(record)
        }
        Ok(record) => {
            info!(slug = %record.slug, id = %record.id, "updated");
            ItemResult::Updated(record)
        }
        Err(failure) => {
            warn!(error = %failure, "submit failed");
            ItemResult::Skipped(SkipReason::Remote { failure })
        }
    };

    let item = ItemOutcome {
        subject,
        change: Some(change),
        result,
    };
    (item, log)
}
