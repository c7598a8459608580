//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use postsync_core::{
    LocalUniverse, ProgressReporter, RunOutcome, RunReport, SyncConfig, run_sync,
    write_github_output,
};
use postsync_markdown::rewrite::join_posix;
use postsync_markdown::{GithubRawResolver, ResourceResolver, load_document};
use postsync_remote::{RemoteClient, RemoteOptions};
use postsync_shared::{
    AppConfig, CONFIG_FILE_NAME, branch_from_ref, init_config, load_config, require_setting,
    split_file_list,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// postsync: publish a directory of Markdown posts to a blog publication.
#[derive(Parser)]
#[command(
    name = "postsync",
    version,
    about = "Reconcile a remote blog publication with locally authored Markdown posts.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ./postsync.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Create or update changed posts, then delist posts removed locally.
    Sync(SyncArgs),

    /// Validate every local post without contacting the remote.
    Check {
        /// Directory holding the posts.
        #[arg(long, env = "POSTS_DIRECTORY")]
        posts_directory: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub(crate) struct SyncArgs {
    /// API token for the publication.
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Host of the publication, e.g. `blog.example.com`.
    #[arg(long, env = "PUBLICATION_HOST")]
    pub publication_host: Option<String>,

    /// Directory holding the posts. Empty means the repository root.
    #[arg(long, env = "POSTS_DIRECTORY")]
    pub posts_directory: Option<String>,

    /// `owner/repo` serving relative images.
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Git ref of the run; the branch is its last segment.
    #[arg(long = "ref", env = "GITHUB_REF")]
    pub git_ref: Option<String>,

    /// File to append `result_json` and `result_summary` to.
    #[arg(long, env = "GITHUB_OUTPUT")]
    pub github_output: Option<PathBuf>,

    /// Space-separated list of added files.
    #[arg(long, env = "ADDED_FILES")]
    pub added_files: Option<String>,

    /// Space-separated list of changed files.
    #[arg(long, env = "CHANGED_FILES")]
    pub changed_files: Option<String>,

    /// Look everything up but create, update, or delist nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Files processed at once (overrides `sync.concurrency`).
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Skip the deletion sweep for this run.
    #[arg(long)]
    pub no_delist: bool,

    /// Exit non-zero when any item was skipped.
    #[arg(long)]
    pub fail_on_error: bool,

    /// Print the full JSON report instead of the summary.
    #[arg(long)]
    pub json: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries
/// the run summary.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "postsync=info",
        1 => "postsync=debug",
        _ => "postsync=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Sync(args) => cmd_sync(config_path, args).await,
        Command::Check { posts_directory } => cmd_check(posts_directory.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_sync(config_path: Option<&Path>, args: SyncArgs) -> Result<()> {
    let config = load_config(config_path)?;

    let access_token = require_setting(args.access_token, "ACCESS_TOKEN")?;
    let publication_host = require_setting(args.publication_host, "PUBLICATION_HOST")?;
    let repository = require_setting(args.repository, "GITHUB_REPOSITORY")?;
    let git_ref = require_setting(args.git_ref, "GITHUB_REF")?;

    let client = Arc::new(RemoteClient::new(&RemoteOptions {
        api_url: config.remote.api_url.clone(),
        access_token,
        timeout_secs: config.remote.timeout_secs,
    })?);
    let resolver: Arc<dyn ResourceResolver> = Arc::new(GithubRawResolver {
        raw_url: config.github.raw_url.clone(),
        repository,
        branch: branch_from_ref(&git_ref).to_string(),
    });

    let sync_config = SyncConfig {
        posts_directory: posts_dir(args.posts_directory.as_deref()),
        added_files: split_file_list(args.added_files.as_deref()),
        changed_files: split_file_list(args.changed_files.as_deref()),
        publication_host,
        concurrency: args.concurrency.unwrap_or(config.sync.concurrency).max(1),
        delist_missing: config.sync.delist_missing && !args.no_delist,
        dry_run: args.dry_run,
    };

    let reporter = CliProgress::new();
    let outcome = run_sync(&sync_config, client, resolver, &reporter).await?;
    let report = RunReport::from_outcome(&outcome);

    match &args.github_output {
        Some(path) => write_github_output(path, &report)?,
        None => info!("GITHUB_OUTPUT not set; skipping output file"),
    }

    if args.json {
        println!("{}", report.to_json_pretty()?);
    } else {
        print!("{}", report.summary());
    }

    if args.fail_on_error && report.has_errors() {
        return Err(eyre!("{} item(s) failed", report.errors.len()));
    }
    Ok(())
}

fn cmd_check(posts_directory: Option<&str>) -> Result<()> {
    let root = posts_dir(posts_directory);
    let universe = LocalUniverse::scan(&root)?;
    let resolver = |base: &Path, relative: &str| join_posix(base, relative);

    let mut problems = 0usize;
    println!();
    for (slug, paths) in universe.slugs() {
        for path in paths {
            match load_document(path, &resolver) {
                Ok(_) => println!("  ok   {slug}  {}", path.display()),
                Err(e) => {
                    problems += 1;
                    println!("  FAIL {slug}  {}: {e}", path.display());
                }
            }
        }
    }
    for (path, reason) in universe.unresolved() {
        problems += 1;
        println!("  FAIL {}: {reason}", path.display());
    }
    for dup in universe.duplicates() {
        problems += 1;
        let paths: Vec<String> = dup.paths.iter().map(|p| p.display().to_string()).collect();
        println!("  DUP  {}  {}", dup.slug, paths.join(", "));
    }
    println!();
    println!("  Documents: {}", universe.document_count());
    println!("  Problems:  {problems}");
    println!();

    if problems > 0 {
        return Err(eyre!("{problems} problem(s) found under {}", root.display()));
    }
    Ok(())
}

fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = config_path.unwrap_or(Path::new(CONFIG_FILE_NAME));
    let path = init_config(path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config: AppConfig = load_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Empty or unset means the current directory.
fn posts_dir(raw: Option<&str>) -> PathBuf {
    raw.map(str::trim).map(PathBuf::from).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item_done(&self, label: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("[{current}/{total}] {label}"));
    }

    fn done(&self, _outcome: &RunOutcome) {
        self.spinner.finish_and_clear();
    }
}
