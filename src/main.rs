use anyhow::Result;
use clap::Parser;
use docs_mirror::cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment
    dotenv::dotenv().ok();

    // Initialize tracing for the CLI.
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = run(cli).await;
    match &result {
        Ok(_) => tracing::info!("docs-mirror completed successfully"),
        Err(e) => tracing::error!(error = %e, "docs-mirror exited with error"),
    }
    result
}
