//! Core domain types shared by the reader, the remote client, and the engine.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Slug
// ---------------------------------------------------------------------------

/// Normalized document identifier, unique within one publication.
///
/// The only way to build one is [`Slug::normalize`], so every `Slug` in the
/// system is already trimmed, lower-cased, and hyphenated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Trim, lower-case, and collapse every whitespace run into a single `-`.
    pub fn normalize(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        Self(lowered.split_whitespace().collect::<Vec<_>>().join("-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Slug {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A tag as the remote side expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub slug: String,
    pub name: String,
}

/// Boolean post settings carried in front matter. All default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentFlags {
    pub enable_table_of_contents: bool,
    pub delisted: bool,
    pub disable_comments: bool,
}

/// Validated, canonical front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    pub title: String,
    pub subtitle: Option<String>,
    pub slug: Slug,
    pub tags: Vec<Tag>,
    /// Caller-supplied value passed through verbatim, or the run's UTC time.
    pub published_at: String,
    pub cover_image: Option<String>,
    pub cover_image_attribution: Option<String>,
    pub flags: DocumentFlags,
}

/// A fully built document, ready to be submitted.
///
/// Built once per file per run and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub path: PathBuf,
    pub slug: Slug,
    pub title: String,
    pub subtitle: Option<String>,
    pub tags: Vec<Tag>,
    pub published_at: String,
    pub cover_image_url: Option<String>,
    pub cover_image_attribution: Option<String>,
    /// Markdown body with resource references already made absolute.
    pub body: String,
    pub flags: DocumentFlags,
}

impl Document {
    /// Assemble a document from validated metadata and a rewritten body.
    ///
    /// `cover_image_url` is taken separately because it is resolved against
    /// the document's location, unlike the raw `cover_image` in `meta`.
    pub fn new(
        path: impl Into<PathBuf>,
        meta: DocumentMeta,
        cover_image_url: Option<String>,
        body: String,
    ) -> Self {
        Self {
            path: path.into(),
            slug: meta.slug,
            title: meta.title,
            subtitle: meta.subtitle,
            tags: meta.tags,
            published_at: meta.published_at,
            cover_image_url,
            cover_image_attribution: meta.cover_image_attribution,
            body,
            flags: meta.flags,
        }
    }
}

// ---------------------------------------------------------------------------
// Remote identity
// ---------------------------------------------------------------------------

/// Opaque publication identifier, resolved once per run from the host name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicationId(pub String);

impl std::fmt::Display for PublicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minimal identity of a remote post. Nothing else is assumed to exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub slug: String,
}

// ---------------------------------------------------------------------------
// Change classification & debug trail
// ---------------------------------------------------------------------------

/// How a changed file was classified by the caller's change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
}

/// One line of the per-run remote call trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebugEntry {
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_normalizes_title() {
        assert_eq!(Slug::normalize("Hello World").as_str(), "hello-world");
        assert_eq!(
            Slug::normalize("  Rust \t and\n  Tokio  ").as_str(),
            "rust-and-tokio"
        );
    }

    #[test]
    fn slug_normalization_is_idempotent() {
        for raw in ["Hello World", "already-a-slug", "  MiXeD   Case\tTabs ", ""] {
            let once = Slug::normalize(raw);
            let twice = Slug::normalize(once.as_str());
            assert_eq!(once, twice, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn slug_keeps_existing_hyphens() {
        assert_eq!(Slug::normalize("My-Post  Two").as_str(), "my-post-two");
    }

    #[test]
    fn document_new_moves_meta_fields() {
        let meta = DocumentMeta {
            title: "Hello".into(),
            subtitle: None,
            slug: Slug::normalize("Hello"),
            tags: vec![Tag {
                slug: "rust".into(),
                name: "Rust".into(),
            }],
            published_at: "2024-01-01T00:00:00Z".into(),
            cover_image: Some("cover.png".into()),
            cover_image_attribution: Some("me".into()),
            flags: DocumentFlags {
                delisted: true,
                ..Default::default()
            },
        };

        let doc = Document::new(
            "posts/hello.md",
            meta,
            Some("https://cdn.example.com/posts/cover.png".into()),
            "body".into(),
        );
        assert_eq!(doc.slug.as_str(), "hello");
        assert_eq!(doc.tags.len(), 1);
        assert!(doc.flags.delisted);
        assert_eq!(
            doc.cover_image_url.as_deref(),
            Some("https://cdn.example.com/posts/cover.png")
        );
    }

    #[test]
    fn remote_record_roundtrip() {
        let record = RemoteRecord {
            id: "abc".into(),
            slug: "hello-world".into(),
        };
        let json = serde_json::to_string(&record).expect("serialize");
        let parsed: RemoteRecord = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, record);
    }
}
