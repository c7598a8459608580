//! Error types for postsync.
//!
//! Library crates use [`PostsyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Two narrower types sit beside it because the sync engine handles them
//! per item instead of propagating them:
//! - [`ValidationError`]: a single document's front matter is unusable.
//! - [`RemoteFailure`]: a single remote call did not succeed.

use std::path::PathBuf;

use serde::Serialize;

/// Top-level error type for all postsync operations.
#[derive(Debug, thiserror::Error)]
pub enum PostsyncError {
    /// Configuration loading or validation error. Fatal to a run.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Serialization or parse error outside of document validation.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// A document failed validation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A remote call failed.
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PostsyncError>;

impl PostsyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Why a document's metadata could not be turned into a canonical record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required front-matter field is absent or blank.
    #[error("missing required front matter field: {field}")]
    MissingField { field: String },

    /// `tags` was given as a list or mapping instead of a comma-separated string.
    #[error("tags must be a comma-separated string")]
    InvalidTagFormat,

    /// A field was present with a YAML shape we cannot use.
    #[error("front matter field `{field}` must be {expected}")]
    InvalidField { field: String, expected: String },

    /// The front-matter block is not valid YAML.
    #[error("invalid front matter: {message}")]
    FrontMatter { message: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            expected: expected.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// RemoteFailure
// ---------------------------------------------------------------------------

/// Structured outcome of a remote call that did not succeed.
///
/// Covers non-2xx HTTP statuses, GraphQL error lists, malformed bodies,
/// and transport errors including timeouts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("remote failure{}: {message}", status_suffix(.status_code))]
pub struct RemoteFailure {
    /// HTTP status, when a response was received at all.
    pub status_code: Option<u16>,
    /// Human-readable description.
    pub message: String,
    /// Raw response body, when one was received.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

fn status_suffix(status_code: &Option<u16>) -> String {
    status_code
        .map(|code| format!(" (HTTP {code})"))
        .unwrap_or_default()
}

impl RemoteFailure {
    /// A failure with no response at all (connect error, timeout, ...).
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
            raw_response: None,
        }
    }

    /// A failure that came back with a response.
    pub fn response(status: u16, message: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            status_code: Some(status),
            message: message.into(),
            raw_response: Some(raw.into()),
        }
    }

    /// Prefix the message with where the failure happened.
    pub fn context(mut self, context: impl std::fmt::Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }
}
