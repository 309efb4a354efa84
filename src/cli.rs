//! CLI glue for docs-mirror: argument parsing and the async entrypoint.
//!
//! All mirroring logic lives in the library modules; this module only wires
//! configuration, the HTTP fetcher and the template renderer together so
//! integration tests can call [`run`] with a constructed [`Cli`].

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::download::{GitHubFetcher, DEFAULT_MAX_IN_FLIGHT};
use crate::load_config::load_config;
use crate::render::TemplateRenderer;
use crate::synchronise::synchronise;

/// Download documentation folders from other repositories and index them for
/// a static site.
#[derive(Parser)]
#[clap(
    name = "docs-mirror",
    version,
    about = "Download versioned documentation folders from GitHub repositories and generate contents pages"
)]
pub struct Cli {
    /// Path to the sources definition configuration file
    #[clap(short = 'c', long, default_value = "sources.json")]
    pub config: PathBuf,

    /// The root folder for all documentation downloads
    #[clap(short = 'r', long, default_value = "content/docs")]
    pub root: PathBuf,

    /// Path to the template directory
    #[clap(long = "template-dir", default_value = "templates")]
    pub template_dir: PathBuf,

    /// Maximum number of concurrent requests against the GitHub API
    #[clap(long, default_value_t = DEFAULT_MAX_IN_FLIGHT)]
    pub max_in_flight: usize,

    /// GitHub access token; pass an empty string for unauthenticated access
    pub access_token: String,
}

/// Extracted async CLI entrypoint for integration tests and main().
pub async fn run(cli: Cli) -> Result<()> {
    let sources = load_config(&cli.config)?;

    // Template problems must surface before any fetch starts.
    let renderer = TemplateRenderer::new(&cli.template_dir)?;

    let access_token = if cli.access_token.is_empty() {
        None
    } else {
        Some(cli.access_token.clone())
    };
    let fetcher = GitHubFetcher::new(access_token, cli.max_in_flight)
        .context("Failed to construct HTTP client")?;

    info!(
        sources = sources.len(),
        root = %cli.root.display(),
        max_in_flight = cli.max_in_flight,
        "Starting mirror run"
    );
    synchronise(&cli.root, &sources, &fetcher, &renderer).await
}
