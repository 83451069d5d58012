//! Record command - report caller-authoritative usage totals.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::open_gate;

#[derive(Args)]
pub struct RecordCmd {
    #[command(subcommand)]
    target: RecordTarget,
}

#[derive(Subcommand)]
enum RecordTarget {
    /// Set a user's storage total after an upload or delete commits
    Storage {
        /// User identifier
        #[arg(long)]
        user: String,

        /// New total storage in bytes
        #[arg(long)]
        bytes: u64,
    },

    /// Set a user's world-element count after creation or deletion
    Elements {
        /// User identifier
        #[arg(long)]
        user: String,

        /// New authoritative element count
        #[arg(long)]
        count: u64,
    },
}

impl RecordCmd {
    pub async fn run(&self) -> Result<()> {
        let gate = open_gate().await?;

        match &self.target {
            RecordTarget::Storage { user, bytes } => {
                gate.record_storage_usage(user, *bytes).await?;
                println!("{user} now using {bytes} bytes of storage");
            }
            RecordTarget::Elements { user, count } => {
                gate.record_element_count(user, *count).await?;
                println!("{user} now has {count} world elements");
            }
        }

        Ok(())
    }
}
