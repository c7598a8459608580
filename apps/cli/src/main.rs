//! postsync CLI: keep a remote blog publication in sync with a directory of
//! Markdown posts.
//!
//! Designed to run as a CI step after a push; every flag can also come from
//! the environment variables a workflow provides.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
