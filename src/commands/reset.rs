//! Reset command - cron entry points for the daily and monthly resets.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::open_gate;

#[derive(Args)]
pub struct ResetCmd {
    #[command(subcommand)]
    period: ResetPeriod,
}

#[derive(Subcommand)]
enum ResetPeriod {
    /// Zero every user's daily request counter (run at midnight)
    Daily,

    /// Zero every user's monthly request and token counters (run on the 1st)
    Monthly,
}

impl ResetCmd {
    pub async fn run(&self) -> Result<()> {
        let gate = open_gate().await?;

        match &self.period {
            ResetPeriod::Daily => {
                let count = gate.reset_daily().await?;
                println!("Daily counters reset for {count} users");
            }
            ResetPeriod::Monthly => {
                let count = gate.reset_monthly().await?;
                println!("Monthly counters reset for {count} users");
            }
        }

        Ok(())
    }
}
