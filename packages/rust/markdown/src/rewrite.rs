//! Rewrites document-relative resource references into absolute URLs.
//!
//! Only the inline image form `![alt](path)` is touched. Code fences, plain
//! links, and images that already point at `http(s)` URLs pass through.

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Matches `![alt](target)` on a single line.
static IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[(.*?)\]\((.*?)\)").expect("image regex"));

/// Maps a document-relative resource to an absolute address.
///
/// `base` is the directory of the document; `relative` is the reference as
/// written by the author.
pub trait ResourceResolver: Send + Sync {
    fn resource_url(&self, base: &Path, relative: &str) -> String;
}

impl<F> ResourceResolver for F
where
    F: Fn(&Path, &str) -> String + Send + Sync,
{
    fn resource_url(&self, base: &Path, relative: &str) -> String {
        self(base, relative)
    }
}

/// Serves resources straight from a repository branch via a raw-content host.
#[derive(Debug, Clone)]
pub struct GithubRawResolver {
    /// e.g. `https://raw.githubusercontent.com`
    pub raw_url: String,
    /// `owner/repo`
    pub repository: String,
    pub branch: String,
}

impl ResourceResolver for GithubRawResolver {
    fn resource_url(&self, base: &Path, relative: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.raw_url.trim_end_matches('/'),
            self.repository.trim_matches('/'),
            self.branch,
            join_posix(base, relative)
        )
    }
}

/// Whether a reference is already absolute. A prefix check, not a URL parse.
pub fn is_absolute(reference: &str) -> bool {
    reference.starts_with("http")
}

/// Replace every relative inline image reference in `body`.
pub fn rewrite_images(body: &str, base: &Path, resolver: &dyn ResourceResolver) -> String {
    IMAGE_RE
        .replace_all(body, |caps: &Captures<'_>| {
            let target = &caps[2];
            if is_absolute(target) {
                return caps[0].to_string();
            }
            format!("![{}]({})", &caps[1], resolver.resource_url(base, target))
        })
        .into_owned()
}

/// Resolve a cover image reference the same way as inline images.
pub fn resolve_cover_image(
    cover: Option<&str>,
    base: &Path,
    resolver: &dyn ResourceResolver,
) -> Option<String> {
    cover.map(|c| {
        if is_absolute(c) {
            c.to_string()
        } else {
            resolver.resource_url(base, c)
        }
    })
}

/// Join `relative` onto `base` as a forward-slash path, folding `.` and `..`.
pub fn join_posix(base: &Path, relative: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for component in base.join(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> GithubRawResolver {
        GithubRawResolver {
            raw_url: "https://raw.githubusercontent.com".into(),
            repository: "owner/blog".into(),
            branch: "main".into(),
        }
    }

    #[test]
    fn rewrites_relative_image() {
        let body = "Intro\n\n![img](assets/a.png)\n";
        let out = rewrite_images(body, Path::new("posts/"), &resolver());
        assert_eq!(
            out,
            "Intro\n\n![img](https://raw.githubusercontent.com/owner/blog/main/posts/assets/a.png)\n"
        );
    }

    #[test]
    fn leaves_absolute_images_alone() {
        let body = "![x](https://cdn.example.com/x.png) and ![y](http://e.com/y.png)";
        let out = rewrite_images(body, Path::new("posts"), &resolver());
        assert_eq!(out, body);
    }

    #[test]
    fn leaves_plain_links_and_code_alone() {
        let body = "[docs](guide/intro.md)\n\n```rust\nprintln!(\"[x](y)\");\n```\n";
        let out = rewrite_images(body, Path::new("posts"), &resolver());
        assert_eq!(out, body);
    }

    #[test]
    fn rewrites_every_occurrence_and_keeps_alt_text() {
        let body = "![first one](a.png) text ![](b/c.jpg)";
        let out = rewrite_images(body, Path::new("posts/2024"), &resolver());
        assert_eq!(
            out,
            "![first one](https://raw.githubusercontent.com/owner/blog/main/posts/2024/a.png) text \
             ![](https://raw.githubusercontent.com/owner/blog/main/posts/2024/b/c.jpg)"
        );
    }

    #[test]
    fn parent_references_are_folded() {
        assert_eq!(join_posix(Path::new("posts/2024"), "../shared/x.png"), "posts/shared/x.png");
        assert_eq!(join_posix(Path::new("./posts"), "./a.png"), "posts/a.png");
        assert_eq!(join_posix(Path::new(""), "a.png"), "a.png");
    }

    #[test]
    fn cover_image_resolution() {
        let base = Path::new("posts");
        assert_eq!(
            resolve_cover_image(Some("cover.png"), base, &resolver()).as_deref(),
            Some("https://raw.githubusercontent.com/owner/blog/main/posts/cover.png")
        );
        assert_eq!(
            resolve_cover_image(Some("https://img.example.com/c.png"), base, &resolver())
                .as_deref(),
            Some("https://img.example.com/c.png")
        );
        assert!(resolve_cover_image(None, base, &resolver()).is_none());
    }

    #[test]
    fn closures_are_resolvers() {
        let custom = |base: &Path, rel: &str| format!("cdn://{}", join_posix(base, rel));
        let out = rewrite_images("![a](b.png)", Path::new("p"), &custom);
        assert_eq!(out, "![a](cdn://p/b.png)");
    }
}
