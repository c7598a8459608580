//! Front-matter validation and normalization.
//!
//! Turns the raw YAML mapping of a document into a [`DocumentMeta`]. Pure:
//! nothing here touches the filesystem or the network.

use chrono::{DateTime, Utc};
use serde_yaml::{Mapping, Value};

use postsync_shared::{DocumentFlags, DocumentMeta, Slug, Tag, ValidationError};

/// Format used when a document carries no `publishedAt`.
const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// Front-matter keys, as authors write them.
const TITLE: &str = "title";
const SUBTITLE: &str = "subtitle";
const SLUG: &str = "slug";
const TAGS: &str = "tags";
const PUBLISHED_AT: &str = "publishedAt";
const COVER_IMAGE: &str = "coverImage";
const COVER_IMAGE_ATTRIBUTION: &str = "coverImageAttribution";
const ENABLE_TOC: &str = "enableTableOfContents";
const DELISTED: &str = "delisted";
const DISABLE_COMMENTS: &str = "disableComments";

/// Validate front matter, defaulting `publishedAt` to the current UTC time.
pub fn validate(raw: &Mapping) -> Result<DocumentMeta, ValidationError> {
    validate_at(raw, Utc::now())
}

/// Validate front matter with an explicit "now" for the `publishedAt` default.
pub fn validate_at(raw: &Mapping, now: DateTime<Utc>) -> Result<DocumentMeta, ValidationError> {
    let title = non_blank(scalar(raw, TITLE)?).ok_or_else(|| ValidationError::missing(TITLE))?;

    // Explicit slugs are normalized too; authors cannot opt out.
    let slug = match non_blank(scalar(raw, SLUG)?) {
        Some(explicit) => Slug::normalize(&explicit),
        None => Slug::normalize(&title),
    };

    let published_at = scalar(raw, PUBLISHED_AT)?
        .unwrap_or_else(|| now.format(PUBLISHED_AT_FORMAT).to_string());

    Ok(DocumentMeta {
        slug,
        subtitle: scalar(raw, SUBTITLE)?,
        tags: tags(raw)?,
        published_at,
        cover_image: non_blank(scalar(raw, COVER_IMAGE)?),
        cover_image_attribution: scalar(raw, COVER_IMAGE_ATTRIBUTION)?,
        flags: DocumentFlags {
            enable_table_of_contents: flag(raw, ENABLE_TOC)?,
            delisted: flag(raw, DELISTED)?,
            disable_comments: flag(raw, DISABLE_COMMENTS)?,
        },
        title,
    })
}

/// The slug a document would get, without validating anything else.
///
/// Used when scanning the whole local tree: a file with a slug or a title
/// still identifies a remote post even if its tags are malformed.
pub fn slug_hint(raw: &Mapping) -> Option<Slug> {
    let explicit = scalar(raw, SLUG).ok().flatten().and_then(|s| non_blank(Some(s)));
    let title = || scalar(raw, TITLE).ok().flatten().and_then(|s| non_blank(Some(s)));
    explicit
        .or_else(title)
        .map(|raw| Slug::normalize(&raw))
        .filter(|slug| !slug.is_empty())
}

/// Split a comma-separated tag string into tags.
///
/// Tokens are trimmed; the slug is the lower-cased token and the name keeps
/// the author's casing. Empty tokens are dropped.
pub fn parse_tags(raw: &str) -> Vec<Tag> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| Tag {
            slug: token.to_lowercase(),
            name: token.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn tags(raw: &Mapping) -> Result<Vec<Tag>, ValidationError> {
    match raw.get(TAGS) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(parse_tags(s)),
        Some(_) => Err(ValidationError::InvalidTagFormat),
    }
}

/// A scalar field rendered as a string. Numbers and booleans are stringified.
fn scalar(raw: &Mapping, field: &str) -> Result<Option<String>, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(_) => Err(ValidationError::invalid(field, "a single value")),
    }
}

fn flag(raw: &Mapping, field: &str) -> Result<bool, ValidationError> {
    match raw.get(field) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(true),
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(false),
        Some(_) => Err(ValidationError::invalid(field, "true or false")),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn yaml(src: &str) -> Mapping {
        serde_yaml::from_str(src).expect("valid yaml mapping")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 5).unwrap()
    }

    #[test]
    fn title_is_required() {
        let err = validate_at(&yaml("subtitle: nope"), fixed_now()).unwrap_err();
        assert_eq!(err, ValidationError::missing("title"));

        let err = validate_at(&yaml("title: '   '"), fixed_now()).unwrap_err();
        assert_eq!(err, ValidationError::missing("title"));
    }

    #[test]
    fn slug_derived_from_title() {
        let meta = validate_at(&yaml(r#"title: "Hello World""#), fixed_now()).unwrap();
        assert_eq!(meta.slug.as_str(), "hello-world");
        assert_eq!(meta.title, "Hello World");
    }

    #[test]
    fn explicit_slug_is_still_normalized() {
        let meta = validate_at(
            &yaml("title: Anything\nslug: '  My  Custom Slug '"),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(meta.slug.as_str(), "my-custom-slug");
    }

    #[test]
    fn tags_trim_name_and_lowercase_slug() {
        let meta = validate_at(&yaml("title: T\ntags: 'a, B ,c'"), fixed_now()).unwrap();
        assert_eq!(
            meta.tags,
            vec![
                Tag { slug: "a".into(), name: "a".into() },
                Tag { slug: "b".into(), name: "B".into() },
                Tag { slug: "c".into(), name: "c".into() },
            ]
        );
    }

    #[test]
    fn structured_tags_are_rejected() {
        let err = validate_at(&yaml("title: T\ntags: [a, b]"), fixed_now()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidTagFormat);

        let err = validate_at(&yaml("title: T\ntags:\n  a: 1"), fixed_now()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidTagFormat);
    }

    #[test]
    fn empty_tag_field_gives_no_tags() {
        let meta = validate_at(&yaml("title: T\ntags: ''"), fixed_now()).unwrap();
        assert!(meta.tags.is_empty());

        let meta = validate_at(&yaml("title: T\ntags:"), fixed_now()).unwrap();
        assert!(meta.tags.is_empty());

        let meta = validate_at(&yaml("title: T"), fixed_now()).unwrap();
        assert!(meta.tags.is_empty());
    }

    #[test]
    fn published_at_defaults_to_now_in_utc() {
        let meta = validate_at(&yaml("title: T"), fixed_now()).unwrap();
        assert_eq!(meta.published_at, "2024-05-17T08:30:05Z");
    }

    #[test]
    fn published_at_passes_through_unmodified() {
        let meta = validate_at(
            &yaml("title: T\npublishedAt: 'not even a date'"),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(meta.published_at, "not even a date");

        let meta = validate_at(
            &yaml("title: T\npublishedAt: 2023-01-02T03:04:05+02:00"),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(meta.published_at, "2023-01-02T03:04:05+02:00");
    }

    #[test]
    fn flags_default_false_and_parse() {
        let meta = validate_at(&yaml("title: T"), fixed_now()).unwrap();
        assert_eq!(meta.flags, DocumentFlags::default());

        let meta = validate_at(
            &yaml("title: T\nenableTableOfContents: true\ndelisted: 'TRUE'\ndisableComments: false"),
            fixed_now(),
        )
        .unwrap();
        assert!(meta.flags.enable_table_of_contents);
        assert!(meta.flags.delisted);
        assert!(!meta.flags.disable_comments);
    }

    #[test]
    fn bad_flag_shape_is_rejected() {
        let err = validate_at(&yaml("title: T\ndelisted: maybe"), fixed_now()).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidField { ref field, .. } if field == "delisted"
        ));
    }

    #[test]
    fn list_title_is_rejected() {
        let err = validate_at(&yaml("title: [a, b]"), fixed_now()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { ref field, .. } if field == "title"));
    }

    #[test]
    fn numeric_title_is_stringified() {
        let meta = validate_at(&yaml("title: 2024"), fixed_now()).unwrap();
        assert_eq!(meta.title, "2024");
        assert_eq!(meta.slug.as_str(), "2024");
    }

    #[test]
    fn optional_fields_carry_over() {
        let meta = validate_at(
            &yaml(
                "title: T\nsubtitle: Sub\ncoverImage: img/c.png\ncoverImageAttribution: Photo by X",
            ),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(meta.subtitle.as_deref(), Some("Sub"));
        assert_eq!(meta.cover_image.as_deref(), Some("img/c.png"));
        assert_eq!(meta.cover_image_attribution.as_deref(), Some("Photo by X"));
    }

    #[test]
    fn slug_hint_survives_bad_tags() {
        let raw = yaml("title: Hello World\ntags: [a]");
        assert!(validate_at(&raw, fixed_now()).is_err());
        assert_eq!(slug_hint(&raw).unwrap().as_str(), "hello-world");

        assert_eq!(slug_hint(&yaml("slug: Explicit One")).unwrap().as_str(), "explicit-one");
        assert!(slug_hint(&yaml("subtitle: nothing")).is_none());
    }
}
