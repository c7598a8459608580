//! The local side of reconciliation: every document under the posts
//! directory, and the subset of changed files a run should submit.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

use postsync_markdown::{read_document, slug_hint};
use postsync_shared::{ChangeKind, PostsyncError, Result, Slug};

use crate::outcome::DuplicateSlug;

const MARKDOWN_EXTENSION: &str = "md";

// ---------------------------------------------------------------------------
// LocalUniverse
// ---------------------------------------------------------------------------

/// Slugs of every local document, plus the files that could not contribute one.
#[derive(Debug, Clone, Default)]
pub struct LocalUniverse {
    slugs: BTreeMap<Slug, Vec<PathBuf>>,
    unresolved: Vec<(PathBuf, String)>,
}

impl LocalUniverse {
    /// Walk `posts_dir` for Markdown files, skipping hidden entries.
    ///
    /// A file only needs an explicit slug or a title to count; the rest of
    /// its front matter is not validated here. An empty `posts_dir` means the
    /// current directory.
    #[instrument(skip_all, fields(posts_dir = %posts_dir.display()))]
    pub fn scan(posts_dir: &Path) -> Result<Self> {
        let root = walk_root(posts_dir);
        if !root.is_dir() {
            return Err(PostsyncError::config(format!(
                "posts directory {} does not exist",
                root.display()
            )));
        }

        let mut universe = Self::default();
        for entry in WalkDir::new(&root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    warn!(path = %path.display(), error = %e, "cannot walk entry");
                    universe.unresolved.push((path, e.to_string()));
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_markdown(entry.path()) {
                continue;
            }

            let path = clean_path(entry.path());
            universe.add_file(path);
        }

        info!(
            documents = universe.document_count(),
            slugs = universe.slugs.len(),
            unresolved = universe.unresolved.len(),
            "scanned local documents"
        );
        Ok(universe)
    }

    fn add_file(&mut self, path: PathBuf) {
        match read_document(&path) {
            Ok(raw) => match slug_hint(&raw.metadata) {
                Some(slug) => {
                    debug!(path = %path.display(), %slug, "local slug");
                    self.slugs.entry(slug).or_default().push(path);
                }
                None => self
                    .unresolved
                    .push((path, "no slug or title in front matter".to_string())),
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read document");
                self.unresolved.push((path, e.to_string()));
            }
        }
    }

    /// Build from known `(slug, path)` pairs without touching the disk.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Slug, P)>,
        P: Into<PathBuf>,
    {
        let mut universe = Self::default();
        for (slug, path) in entries {
            universe.slugs.entry(slug).or_default().push(path.into());
        }
        universe
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.slugs.contains_key(slug)
    }

    /// Files sharing `slug`, when more than one does.
    pub fn duplicate_paths(&self, slug: &str) -> Option<&[PathBuf]> {
        self.slugs
            .get(slug)
            .filter(|paths| paths.len() > 1)
            .map(Vec::as_slice)
    }

    /// Every slug claimed by more than one file, in slug order.
    pub fn duplicates(&self) -> Vec<DuplicateSlug> {
        self.slugs
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(slug, paths)| DuplicateSlug {
                slug: slug.to_string(),
                paths: paths.clone(),
            })
            .collect()
    }

    pub fn slugs(&self) -> impl Iterator<Item = (&Slug, &[PathBuf])> {
        self.slugs.iter().map(|(slug, paths)| (slug, paths.as_slice()))
    }

    /// Files that contributed no slug, with the reason.
    pub fn unresolved(&self) -> &[(PathBuf, String)] {
        &self.unresolved
    }

    pub fn document_count(&self) -> usize {
        self.slugs.values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// Changed-file selection
// ---------------------------------------------------------------------------

/// A changed file the run will submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: PathBuf,
    pub change: ChangeKind,
}

/// Keep Markdown files under `posts_dir`, added files first.
///
/// Files under hidden directories are skipped, matching [`LocalUniverse::scan`].
/// A path listed as both added and changed counts as added. Duplicates are
/// dropped, keeping the first occurrence.
pub fn select_changed(
    posts_dir: &Path,
    added: &[PathBuf],
    changed: &[PathBuf],
) -> Vec<ChangedFile> {
    let scope = clean_path(posts_dir);
    let mut seen = HashSet::new();

    let tagged = added
        .iter()
        .map(|p| (p, ChangeKind::Added))
        .chain(changed.iter().map(|p| (p, ChangeKind::Modified)));

    let mut selected = Vec::new();
    for (path, change) in tagged {
        let path = clean_path(path);
        if !is_markdown(&path) || !path.starts_with(&scope) {
            debug!(path = %path.display(), "outside posts directory or not markdown");
            continue;
        }
        if is_hidden_below(&scope, &path) {
            debug!(path = %path.display(), "hidden path");
            continue;
        }
        if seen.insert(path.clone()) {
            selected.push(ChangedFile { path, change });
        }
    }
    selected
}

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

fn walk_root(posts_dir: &Path) -> PathBuf {
    if posts_dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        posts_dir.to_path_buf()
    }
}

/// Drop `.` components so `./posts/a.md` and `posts/a.md` compare equal.
fn clean_path(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

fn is_markdown(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(MARKDOWN_EXTENSION)
}

fn is_hidden(entry: &DirEntry) -> bool {
    is_hidden_name(entry.file_name())
}

/// Any component of `path` below `scope` is hidden.
fn is_hidden_below(scope: &Path, path: &Path) -> bool {
    path.strip_prefix(scope).is_ok_and(|rel| {
        rel.components()
            .any(|c| matches!(c, Component::Normal(name) if is_hidden_name(name)))
    })
}

fn is_hidden_name(name: &OsStr) -> bool {
    name.to_str().is_some_and(|name| name.starts_with('.'))
}
