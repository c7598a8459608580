//! GraphQL operation documents and the request/response envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use postsync_shared::RemoteRecord;

/// Page size used when listing a publication's posts.
pub const PAGE_SIZE: u32 = 50;

/// A named GraphQL document.
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    pub document: &'static str,
}

pub const PUBLICATION_BY_HOST: Operation = Operation {
    name: "PublicationByHost",
    document: r#"query PublicationByHost($host: String!) {
  publication(host: $host) {
    id
  }
}"#,
};

pub const POST_BY_SLUG: Operation = Operation {
    name: "PostBySlug",
    document: r#"query PostBySlug($publicationId: ObjectId!, $slug: String!) {
  publication(id: $publicationId) {
    post(slug: $slug) {
      id
    }
  }
}"#,
};

pub const LIST_POSTS: Operation = Operation {
    name: "ListPosts",
    document: r#"query ListPosts($publicationId: ObjectId!, $first: Int!, $after: String) {
  publication(id: $publicationId) {
    posts(first: $first, after: $after) {
      edges {
        node {
          id
          slug
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}"#,
};

pub const PUBLISH_POST: Operation = Operation {
    name: "PublishPost",
    document: r#"mutation PublishPost($input: PublishPostInput!) {
  publishPost(input: $input) {
    post {
      id
      title
      slug
    }
  }
}"#,
};

pub const UPDATE_POST: Operation = Operation {
    name: "UpdatePost",
    document: r#"mutation UpdatePost($input: UpdatePostInput!) {
  updatePost(input: $input) {
    post {
      id
      title
      slug
    }
  }
}"#,
};

pub const DELIST_POST: Operation = Operation {
    name: "DelistPost",
    document: r#"mutation DelistPost($input: UpdatePostInput!) {
  updatePost(input: $input) {
    post {
      id
      slug
      preferences {
        isDelisted
      }
    }
  }
}"#,
};

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphqlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub operation_name: &'a str,
    pub variables: V,
}

impl<'a, V: Serialize> GraphqlRequest<'a, V> {
    pub fn new(operation: Operation, variables: V) -> Self {
        Self {
            query: operation.document,
            operation_name: operation.name,
            variables,
        }
    }
}

/// Response envelope. `data` stays untyped until `errors` has been checked.
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    #[serde(default)]
    pub message: String,
}

/// Join GraphQL error messages into a single line.
pub fn join_errors(errors: &[GraphqlError]) -> String {
    let messages: Vec<&str> = errors
        .iter()
        .map(|e| e.message.as_str())
        .filter(|m| !m.is_empty())
        .collect();
    if messages.is_empty() {
        "GraphQL request returned errors".to_string()
    } else {
        messages.join("; ")
    }
}

// ---------------------------------------------------------------------------
// Data shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PublicationData {
    pub publication: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
pub struct IdNode {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct PostBySlugData {
    pub publication: Option<PublicationPost>,
}

#[derive(Debug, Deserialize)]
pub struct PublicationPost {
    pub post: Option<IdNode>,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsData {
    pub publication: Option<PublicationPosts>,
}

#[derive(Debug, Deserialize)]
pub struct PublicationPosts {
    pub posts: PostConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostConnection {
    pub edges: Vec<PostEdge>,
    pub page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
pub struct PostEdge {
    pub node: RemoteRecord,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPostData {
    pub publish_post: PostPayload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostData {
    pub update_post: PostPayload,
}

#[derive(Debug, Deserialize)]
pub struct PostPayload {
    pub post: Option<RemoteRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelistPostData {
    pub update_post: DelistPayload,
}

#[derive(Debug, Deserialize)]
pub struct DelistPayload {
    pub post: Option<DelistedPost>,
}

#[derive(Debug, Deserialize)]
pub struct DelistedPost {
    pub id: String,
    pub preferences: Option<PostPreferences>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPreferences {
    #[serde(default)]
    pub is_delisted: bool,
}
