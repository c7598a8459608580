//! Mutation inputs built from a canonical [`Document`].
//!
//! Create and update inputs are not symmetric: the remote schema names the
//! table-of-contents flag differently in each, create pins the slug with
//! `slugOverridden`, and `disableComments` lives at the top level on create
//! but inside `settings` on update.

use serde::Serialize;

use postsync_shared::{Document, PublicationId, Tag};

/// The write to issue for one document, decided once from the slug lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum PostMutation {
    Create(PublishPostInput),
    Update(UpdatePostInput),
}

impl PostMutation {
    /// Update when the slug already exists remotely, create otherwise.
    pub fn for_document(
        doc: &Document,
        publication: &PublicationId,
        existing_id: Option<String>,
    ) -> Self {
        let common = CommonFields::from_document(doc, publication);
        match existing_id {
            Some(id) => Self::Update(UpdatePostInput {
                id,
                common,
                settings: UpdatePostSettings {
                    is_table_of_content_enabled: doc.flags.enable_table_of_contents,
                    delisted: doc.flags.delisted,
                    disable_comments: doc.flags.disable_comments,
                },
            }),
            None => Self::Create(PublishPostInput {
                common,
                disable_comments: doc.flags.disable_comments,
                settings: PublishPostSettings {
                    enable_table_of_content: doc.flags.enable_table_of_contents,
                    delisted: doc.flags.delisted,
                    slug_overridden: true,
                },
            }),
        }
    }

    pub fn is_create(&self) -> bool {
        matches!(self, Self::Create(_))
    }
}

/// Fields both mutations carry under the same names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonFields {
    pub title: String,
    pub subtitle: Option<String>,
    pub publication_id: String,
    pub content_markdown: String,
    pub published_at: String,
    pub cover_image_options: CoverImageOptions,
    pub slug: String,
    pub tags: Vec<Tag>,
}

impl CommonFields {
    fn from_document(doc: &Document, publication: &PublicationId) -> Self {
        Self {
            title: doc.title.clone(),
            subtitle: doc.subtitle.clone(),
            publication_id: publication.0.clone(),
            content_markdown: doc.body.clone(),
            published_at: doc.published_at.clone(),
            cover_image_options: CoverImageOptions {
                cover_image_url: doc.cover_image_url.clone(),
                cover_image_attribution: doc.cover_image_attribution.clone(),
            },
            slug: doc.slug.as_str().to_string(),
            tags: doc.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoverImageOptions {
    #[serde(rename = "coverImageURL")]
    pub cover_image_url: Option<String>,
    #[serde(rename = "coverImageAttribution")]
    pub cover_image_attribution: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostInput {
    #[serde(flatten)]
    pub common: CommonFields,
    pub disable_comments: bool,
    pub settings: PublishPostSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostSettings {
    pub enable_table_of_content: bool,
    pub delisted: bool,
    pub slug_overridden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostInput {
    pub id: String,
    #[serde(flatten)]
    pub common: CommonFields,
    pub settings: UpdatePostSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostSettings {
    pub is_table_of_content_enabled: bool,
    pub delisted: bool,
    pub disable_comments: bool,
}

/// Input for the soft-delete mutation.
#[derive(Debug, Clone, Serialize)]
pub struct DelistInput<'a> {
    pub id: &'a str,
    pub settings: DelistSettings,
}

#[derive(Debug, Clone, Serialize)]
pub struct DelistSettings {
    pub delisted: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use postsync_shared::{DocumentFlags, Slug};
    use serde_json::json;
    use std::path::PathBuf;

    fn document() -> Document {
        Document {
            path: PathBuf::from("posts/hello.md"),
            slug: Slug::normalize("Hello World"),
            title: "Hello World".into(),
            subtitle: None,
            tags: vec![Tag {
                slug: "rust".into(),
                name: "Rust".into(),
            }],
            published_at: "2024-01-01T00:00:00Z".into(),
            cover_image_url: Some("https://cdn.example.com/c.png".into()),
            cover_image_attribution: None,
            body: "# Hello".into(),
            flags: DocumentFlags {
                enable_table_of_contents: true,
                delisted: false,
                disable_comments: true,
            },
        }
    }

    #[test]
    fn create_payload_shape() {
        let mutation = PostMutation::for_document(&document(), &PublicationId("pub1".into()), None);
        assert!(mutation.is_create());
        let PostMutation::Create(input) = mutation else { unreachable!() };
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["publicationId"], "pub1");
        assert_eq!(value["slug"], "hello-world");
        assert_eq!(value["contentMarkdown"], "# Hello");
        assert_eq!(value["subtitle"], serde_json::Value::Null);
        assert_eq!(value["disableComments"], true);
        assert_eq!(
            value["settings"],
            json!({ "enableTableOfContent": true, "delisted": false, "slugOverridden": true })
        );
        assert_eq!(
            value["coverImageOptions"]["coverImageURL"],
            "https://cdn.example.com/c.png"
        );
        assert_eq!(value["tags"], json!([{ "slug": "rust", "name": "Rust" }]));
        assert!(value.get("id").is_none());
    }

    #[test]
    fn update_payload_shape() {
        let mutation = PostMutation::for_document(
            &document(),
            &PublicationId("pub1".into()),
            Some("post-9".into()),
        );
        assert!(!mutation.is_create());
        let PostMutation::Update(input) = mutation else { unreachable!() };
        let value = serde_json::to_value(&input).unwrap();

        assert_eq!(value["id"], "post-9");
        assert_eq!(
            value["settings"],
            json!({ "isTableOfContentEnabled": true, "delisted": false, "disableComments": true })
        );
        assert!(value.get("disableComments").is_none());
        assert!(value["settings"].get("slugOverridden").is_none());
    }
}
