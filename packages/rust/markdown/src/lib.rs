//! Local document handling: reading, front-matter validation, and resource
//! rewriting.
//!
//! [`load_document`] is the main entry point. It:
//! 1. Reads the file and splits the YAML front matter from the body
//! 2. Validates and normalizes the front matter ([`metadata`])
//! 3. Rewrites relative images and the cover image to absolute URLs ([`rewrite`])

pub mod metadata;
pub mod rewrite;

use std::path::Path;

use serde_yaml::{Mapping, Value};
use tracing::{debug, instrument};

use postsync_shared::{Document, PostsyncError, Result, ValidationError};

pub use metadata::{parse_tags, slug_hint, validate, validate_at};
pub use rewrite::{GithubRawResolver, ResourceResolver, rewrite_images};

/// Front-matter fence line.
const FENCE: &str = "---";

/// A document as found on disk, before any validation.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Parsed front matter; empty when the file has none.
    pub metadata: Mapping,
    pub body: String,
}

/// Read a document from disk and split its front matter from its body.
pub fn read_document(path: &Path) -> Result<RawDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| PostsyncError::io(path, e))?;
    let (metadata, body) = split_front_matter(&content)?;

    Ok(RawDocument { metadata, body })
}

/// Split `---` delimited YAML front matter from the Markdown body.
///
/// A file without an opening fence, or with an opening fence that is never
/// closed, has no front matter and is all body. An empty block yields an
/// empty mapping.
pub fn split_front_matter(
    content: &str,
) -> std::result::Result<(Mapping, String), ValidationError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.split_inclusive('\n');

    let mut offset = match lines.next() {
        Some(first) if first.trim_end() == FENCE => first.len(),
        _ => return Ok((Mapping::new(), content.to_string())),
    };
    let yaml_start = offset;
    let mut yaml_end = None;

    for line in lines {
        if line.trim_end() == FENCE {
            yaml_end = Some(offset);
            offset += line.len();
            break;
        }
        offset += line.len();
    }

    let Some(yaml_end) = yaml_end else {
        return Ok((Mapping::new(), content.to_string()));
    };

    let metadata = parse_front_matter(&content[yaml_start..yaml_end])?;
    let body = content[offset..].trim_start_matches(['\r', '\n']).to_string();
    Ok((metadata, body))
}

fn parse_front_matter(yaml: &str) -> std::result::Result<Mapping, ValidationError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }

    let value: Value = serde_yaml::from_str(yaml).map_err(|e| ValidationError::FrontMatter {
        message: e.to_string(),
    })?;

    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(ValidationError::FrontMatter {
            message: "front matter must be a mapping of fields".into(),
        }),
    }
}

/// Build the canonical [`Document`] for a file on disk.
///
/// Relative references are resolved against the file's parent directory.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_document(path: &Path, resolver: &dyn ResourceResolver) -> Result<Document> {
    let raw = read_document(path)?;
    let meta = metadata::validate(&raw.metadata)?;

    let base = path.parent().unwrap_or(Path::new(""));
    let body = rewrite::rewrite_images(&raw.body, base, resolver);
    let cover = rewrite::resolve_cover_image(meta.cover_image.as_deref(), base, resolver);

    debug!(slug = %meta.slug, tags = meta.tags.len(), "document built");
    Ok(Document::new(path, meta, cover, body))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
