//! Shared types, error model, and configuration for postsync.
//!
//! This crate is the foundation depended on by all other postsync crates.
//! It provides:
//! - [`PostsyncError`], [`ValidationError`], [`RemoteFailure`]: the error model
//! - Domain types ([`Document`], [`Slug`], [`RemoteRecord`], [`PublicationId`])
//! - Configuration ([`AppConfig`], config loading, CI environment helpers)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CONFIG_FILE_NAME, GithubConfig, RemoteConfig, SyncPolicyConfig, branch_from_ref,
    init_config, load_config, load_config_from, require_setting, split_file_list,
    validate_config,
};
pub use error::{PostsyncError, RemoteFailure, Result, ValidationError};
pub use types::{
    ChangeKind, DebugEntry, Document, DocumentFlags, DocumentMeta, PublicationId, RemoteRecord,
    Slug, Tag,
};
