//! GraphQL client for the remote publication.
//!
//! Every operation returns `Result<_, RemoteFailure>`: non-2xx statuses,
//! GraphQL error lists, malformed bodies and transport errors (timeouts
//! included) are all folded into a [`RemoteFailure`] so the caller can
//! decide per item whether to continue. Each call also appends one entry to
//! the caller's [`DebugLog`], whatever its outcome.

pub mod debug;
pub mod graphql;
pub mod payload;

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument, warn};

use postsync_shared::{PostsyncError, PublicationId, RemoteFailure, RemoteRecord, Result};

pub use debug::DebugLog;
pub use graphql::{Operation, PAGE_SIZE};
pub use payload::{PostMutation, PublishPostInput, UpdatePostInput};

use graphql::{
    DELIST_POST, DelistPostData, GraphqlRequest, GraphqlResponse, LIST_POSTS, ListPostsData,
    POST_BY_SLUG, PUBLICATION_BY_HOST, PUBLISH_POST, PostBySlugData, PublicationData,
    PublishPostData, UPDATE_POST, UpdatePostData, join_errors,
};
use payload::{DelistInput, DelistSettings};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("postsync/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RemoteOptions {
    /// GraphQL endpoint.
    pub api_url: String,
    /// Sent as `Authorization: Bearer <token>`.
    pub access_token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// RemoteClient
// ---------------------------------------------------------------------------

/// Client for one remote API endpoint. Cheap to share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    client: Client,
    api_url: String,
}

impl RemoteClient {
    /// Build a client. Only an unusable token or TLS setup fails here.
    pub fn new(opts: &RemoteOptions) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", opts.access_token))
            .map_err(|_| PostsyncError::config("access token contains invalid header characters"))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| PostsyncError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url: opts.api_url.clone(),
        })
    }

    /// Resolve the publication that owns every record touched in a run.
    #[instrument(skip_all, fields(host = %host))]
    pub async fn resolve_publication(
        &self,
        log: &mut DebugLog,
        host: &str,
    ) -> std::result::Result<PublicationId, RemoteFailure> {
        let result = self
            .execute::<PublicationData, _>(PUBLICATION_BY_HOST, json!({ "host": host }))
            .await
            .and_then(|data| {
                data.publication
                    .map(|p| PublicationId(p.id))
                    .ok_or_else(|| empty_result(format!("no publication found for host {host}")))
            });

        match &result {
            Ok(id) => {
                debug!(publication = %id, "publication resolved");
                log.record(format!("Publication ID: {id}"));
            }
            Err(e) => log.record(format!("Publication lookup for {host} failed: {e}")),
        }
        result
    }

    /// Look up a post id by slug. `Ok(None)` means no such post.
    #[instrument(skip_all, fields(slug = %slug))]
    pub async fn find_by_slug(
        &self,
        log: &mut DebugLog,
        publication: &PublicationId,
        slug: &str,
    ) -> std::result::Result<Option<String>, RemoteFailure> {
        let variables = json!({ "publicationId": publication.0, "slug": slug });
        let result = self
            .execute::<PostBySlugData, _>(POST_BY_SLUG, variables)
            .await
            .and_then(|data| {
                data.publication
                    .map(|p| p.post.map(|post| post.id))
                    .ok_or_else(|| empty_result(format!("publication {publication} not found")))
            });

        match &result {
            Ok(id) => {
                debug!(found = id.is_some(), "slug lookup");
                log.record(format!("Slug: {slug}, Post ID: {}", id.as_deref().unwrap_or("none")));
            }
            Err(e) => log.record(format!("Slug lookup for {slug} failed: {e}")),
        }
        result
    }

    /// Enumerate every post of the publication, following cursors.
    ///
    /// A failure on any page aborts the listing; the failure message says
    /// which page failed and how many records had been collected.
    #[instrument(skip_all, fields(publication = %publication))]
    pub async fn list_all(
        &self,
        log: &mut DebugLog,
        publication: &PublicationId,
    ) -> std::result::Result<Vec<RemoteRecord>, RemoteFailure> {
        let mut records = Vec::new();
        let mut after: Option<String> = None;
        let mut page = 1usize;

        loop {
            let variables = json!({
                "publicationId": publication.0,
                "first": PAGE_SIZE,
                "after": after,
            });
            let result = self
                .execute::<ListPostsData, _>(LIST_POSTS, variables)
                .await
                .and_then(|data| {
                    data.publication
                        .map(|p| p.posts)
                        .ok_or_else(|| empty_result(format!("publication {publication} not found")))
                });

            let connection = match result {
                Ok(connection) => connection,
                Err(e) => {
                    let e = e.context(format!(
                        "listing page {page} after {} records",
                        records.len()
                    ));
                    warn!(error = %e, "listing aborted");
                    log.record(format!("List posts failed: {e}"));
                    return Err(e);
                }
            };

            let fetched = connection.edges.len();
            records.extend(connection.edges.into_iter().map(|edge| edge.node));
            debug!(page, fetched, total = records.len(), "listed page");
            log.record(format!("Listed page {page}: {fetched} posts, {} total", records.len()));

            if !connection.page_info.has_next_page {
                break;
            }
            match connection.page_info.end_cursor {
                Some(cursor) if after.as_deref() != Some(cursor.as_str()) => after = Some(cursor),
                _ => {
                    let e = empty_result("pagination cursor did not advance")
                        .context(format!("listing page {page} after {} records", records.len()));
                    warn!(error = %e, "listing aborted");
                    log.record(format!("List posts failed: {e}"));
                    return Err(e);
                }
            }
            page += 1;
        }

        Ok(records)
    }

    /// Create a post.
    #[instrument(skip_all, fields(slug = %input.common.slug))]
    pub async fn create(
        &self,
        log: &mut DebugLog,
        input: &PublishPostInput,
    ) -> std::result::Result<RemoteRecord, RemoteFailure> {
        let result = self
            .execute::<PublishPostData, _>(PUBLISH_POST, json!({ "input": input }))
            .await
            .and_then(|data| {
                data.publish_post
                    .post
                    .ok_or_else(|| empty_result("publishPost returned no post"))
            });

        match &result {
            Ok(record) => log.record(format!("Created post {} ({})", record.slug, record.id)),
            Err(e) => log.record(format!("Create {} failed: {e}", input.common.slug)),
        }
        result
    }

    /// Update an existing post.
    #[instrument(skip_all, fields(slug = %input.common.slug, id = %input.id))]
    pub async fn update(
        &self,
        log: &mut DebugLog,
        input: &UpdatePostInput,
    ) -> std::result::Result<RemoteRecord, RemoteFailure> {
        let result = self
            .execute::<UpdatePostData, _>(UPDATE_POST, json!({ "input": input }))
            .await
            .and_then(|data| {
                data.update_post
                    .post
                    .ok_or_else(|| empty_result("updatePost returned no post"))
            });

        match &result {
            Ok(record) => log.record(format!("Updated post {} ({})", record.slug, record.id)),
            Err(e) => log.record(format!(
                "Update {} ({}) failed: {e}",
                input.common.slug, input.id
            )),
        }
        result
    }

    /// Issue whichever write the mutation calls for.
    pub async fn submit(
        &self,
        log: &mut DebugLog,
        mutation: &PostMutation,
    ) -> std::result::Result<RemoteRecord, RemoteFailure> {
        match mutation {
            PostMutation::Create(input) => self.create(log, input).await,
            PostMutation::Update(input) => self.update(log, input).await,
        }
    }

    /// Soft-delete a post. Returns the delisted flag the remote reports back.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delist(
        &self,
        log: &mut DebugLog,
        id: &str,
    ) -> std::result::Result<bool, RemoteFailure> {
        let input = DelistInput {
            id,
            settings: DelistSettings { delisted: true },
        };
        let result = self
            .execute::<DelistPostData, _>(DELIST_POST, json!({ "input": input }))
            .await
            .and_then(|data| {
                data.update_post
                    .post
                    .ok_or_else(|| empty_result("updatePost returned no post"))
            })
            .map(|post| post.preferences.is_some_and(|p| p.is_delisted));

        match &result {
            Ok(delisted) => log.record(format!("Delisted post {id}: {delisted}")),
            Err(e) => log.record(format!("Delist {id} failed: {e}")),
        }
        result
    }

    /// POST one operation and decode its `data`.
    async fn execute<T, V>(
        &self,
        operation: Operation,
        variables: V,
    ) -> std::result::Result<T, RemoteFailure>
    where
        T: DeserializeOwned,
        V: Serialize,
    {
        let request = GraphqlRequest::new(operation, variables);
        let response = self
            .client
            .post(&self.api_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RemoteFailure::transport(format!("{}: request timed out", operation.name))
                } else {
                    RemoteFailure::transport(format!("{}: {e}", operation.name))
                }
            })?;

        let status = response.status();
        let code = status.as_u16();
        let body = response.text().await.map_err(|e| {
            RemoteFailure::transport(format!("{}: failed to read body: {e}", operation.name))
        })?;
        debug!(operation = operation.name, status = code, bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(RemoteFailure::response(code, format!("HTTP {status}"), body));
        }

        let envelope: GraphqlResponse = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                return Err(RemoteFailure::response(code, format!("malformed response: {e}"), body));
            }
        };

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            return Err(RemoteFailure::response(code, join_errors(&errors), body));
        }

        let Some(data) = envelope.data.filter(|data| !data.is_null()) else {
            return Err(RemoteFailure::response(code, "response carried no data", body));
        };

        serde_json::from_value(data).map_err(|e| {
            RemoteFailure::response(code, format!("unexpected response shape: {e}"), body)
        })
    }
}

/// A well-formed response that lacks the object the call needs.
fn empty_result(message: impl Into<String>) -> RemoteFailure {
    RemoteFailure {
        status_code: None,
        message: message.into(),
        raw_response: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
