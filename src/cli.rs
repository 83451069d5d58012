//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{CheckCmd, PlanCmd, RecordCmd, ResetCmd};

#[derive(Parser)]
#[command(name = "ugate")]
#[command(about = "Usage gate - subscription entitlement checks and usage metering")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run an entitlement check (and record AI usage if allowed)
    Check(CheckCmd),

    /// Show or overwrite a user's plan
    Plan(PlanCmd),

    /// Record caller-authoritative usage totals
    Record(RecordCmd),

    /// Reset daily or monthly usage counters (cron entry points)
    Reset(ResetCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Check(cmd) => cmd.run().await,
            Command::Plan(cmd) => cmd.run().await,
            Command::Record(cmd) => cmd.run().await,
            Command::Reset(cmd) => cmd.run().await,
        }
    }
}
