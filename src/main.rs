//! Usage gate CLI - subscription entitlement checks and usage metering.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use usage_gate::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Controlled by the RUST_LOG env var.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();
    cli.command.execute().await
}
