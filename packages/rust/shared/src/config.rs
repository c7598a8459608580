//! Application configuration for postsync.
//!
//! Optional project config lives at `./postsync.toml` (or the path given
//! with `--config`). CLI flags and the CI environment override config file
//! values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PostsyncError, Result};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "postsync.toml";

// ---------------------------------------------------------------------------
// Config structs (matching postsync.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote API settings.
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Where relative resources are served from.
    #[serde(default)]
    pub github: GithubConfig,

    /// Reconciliation behavior.
    #[serde(default)]
    pub sync: SyncPolicyConfig,
}

/// `[remote]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// GraphQL endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://gql.hashnode.com".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Base URL serving raw repository files.
    #[serde(default = "default_raw_url")]
    pub raw_url: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            raw_url: default_raw_url(),
        }
    }
}

fn default_raw_url() -> String {
    "https://raw.githubusercontent.com".into()
}

/// `[sync]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncPolicyConfig {
    /// Number of documents reconciled at once. `1` is strictly sequential.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Whether to delist remote posts that have no local document.
    #[serde(default = "default_true")]
    pub delist_missing: bool,
}

impl Default for SyncPolicyConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            delist_missing: true,
        }
    }
}

fn default_concurrency() -> usize {
    1
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the config from `explicit`, or from `./postsync.toml` if present.
///
/// An explicit path must exist; the implicit one silently falls back to
/// defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig> {
    let config = match explicit {
        Some(path) => load_config_from(path)?,
        None => {
            let path = PathBuf::from(CONFIG_FILE_NAME);
            if path.exists() {
                load_config_from(&path)?
            } else {
                tracing::debug!(?path, "config file not found, using defaults");
                AppConfig::default()
            }
        }
    };

    validate_config(&config)?;
    Ok(config)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| PostsyncError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        PostsyncError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Write a default config file to `path`. Refuses to overwrite.
pub fn init_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Err(PostsyncError::config(format!(
            "{} already exists",
            path.display()
        )));
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| PostsyncError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| PostsyncError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path.to_path_buf())
}

/// Reject values that would only fail later, mid-run.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    for (name, value) in [
        ("remote.api_url", &config.remote.api_url),
        ("github.raw_url", &config.github.raw_url),
    ] {
        Url::parse(value)
            .map_err(|e| PostsyncError::config(format!("{name} '{value}' is not a URL: {e}")))?;
    }

    if config.remote.timeout_secs == 0 {
        return Err(PostsyncError::config("remote.timeout_secs must be at least 1"));
    }
    if config.sync.concurrency == 0 {
        return Err(PostsyncError::config("sync.concurrency must be at least 1"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CI environment helpers
// ---------------------------------------------------------------------------

/// Return a required setting, or a config error naming its env var.
pub fn require_setting(value: Option<String>, env_var: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(PostsyncError::config(format!(
            "{env_var} is not set. Pass it as a flag or export the environment variable."
        ))),
    }
}

/// Branch name from a git ref: `refs/heads/main` → `main`.
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.rsplit('/').next().unwrap_or(git_ref)
}

/// Split a whitespace-separated file list, as produced by changed-files actions.
pub fn split_file_list(raw: Option<&str>) -> Vec<PathBuf> {
    raw.unwrap_or_default()
        .split_whitespace()
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("api_url"));
        assert!(toml_str.contains("https://gql.hashnode.com"));
        assert!(toml_str.contains("delist_missing"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.remote.timeout_secs, 30);
        assert_eq!(parsed.sync.concurrency, 1);
        assert!(parsed.sync.delist_missing);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[sync]
concurrency = 4
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sync.concurrency, 4);
        assert!(config.sync.delist_missing);
        assert_eq!(config.github.raw_url, "https://raw.githubusercontent.com");
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.remote.api_url = "not a url".into();
        assert!(validate_config(&config).is_err());

        let mut config = AppConfig::default();
        config.sync.concurrency = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("concurrency"));
    }

    #[test]
    fn init_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(CONFIG_FILE_NAME);

        init_config(&path).expect("init");
        let loaded = load_config(Some(&path)).expect("load");
        assert_eq!(loaded.remote.api_url, "https://gql.hashnode.com");

        let err = init_config(&path).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn branch_is_last_ref_segment() {
        assert_eq!(branch_from_ref("refs/heads/main"), "main");
        assert_eq!(branch_from_ref("refs/heads/feature/x"), "x");
        assert_eq!(branch_from_ref("main"), "main");
    }

    #[test]
    fn file_list_splits_on_whitespace() {
        let files = split_file_list(Some("posts/a.md  posts/b.md\nposts/c.md"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("posts/a.md"),
                PathBuf::from("posts/b.md"),
                PathBuf::from("posts/c.md")
            ]
        );
        assert!(split_file_list(Some("   ")).is_empty());
        assert!(split_file_list(None).is_empty());
    }

    #[test]
    fn required_setting_rejects_blank() {
        assert!(require_setting(Some("  ".into()), "ACCESS_TOKEN").is_err());
        assert!(require_setting(None, "ACCESS_TOKEN")
            .unwrap_err()
            .to_string()
            .contains("ACCESS_TOKEN"));
        assert_eq!(
            require_setting(Some("tok".into()), "ACCESS_TOKEN").expect("set"),
            "tok"
        );
    }
}
