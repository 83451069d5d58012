//! Check command - run entitlement checks against the gate.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::gate::Decision;
use crate::types::OperationKind;

use super::open_gate;

#[derive(Args)]
pub struct CheckCmd {
    #[command(subcommand)]
    target: CheckTarget,
}

#[derive(Subcommand)]
enum CheckTarget {
    /// Check an AI request and record it if allowed
    Ai {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Model the request wants to call
        #[arg(long)]
        model: String,

        /// Operation kind: generate, stream, or analyze
        #[arg(long)]
        operation: OperationKind,

        /// Estimated token cost of the request
        #[arg(long, default_value_t = 0)]
        tokens: u64,

        /// Print the full decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether an upload would fit the storage quota
    Storage {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Bytes about to be added
        #[arg(long)]
        bytes: u64,

        /// Print the full decision as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether new world elements would fit the plan ceiling
    Elements {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Elements about to be created
        #[arg(long, default_value_t = 1)]
        count: u64,

        /// Print the full decision as JSON
        #[arg(long)]
        json: bool,
    },
}

impl CheckCmd {
    pub async fn run(&self) -> Result<()> {
        let gate = open_gate().await?;

        let (decision, json) = match &self.target {
            CheckTarget::Ai {
                user,
                model,
                operation,
                tokens,
                json,
            } => (
                gate.check_ai_usage(user, model, *operation, *tokens).await?,
                *json,
            ),
            CheckTarget::Storage { user, bytes, json } => {
                (gate.check_storage_usage(user, *bytes).await?, *json)
            }
            CheckTarget::Elements { user, count, json } => {
                (gate.check_element_limit(user, *count).await?, *json)
            }
        };

        report(&decision, json)?;

        // Shell callers branch on the exit code.
        if !decision.allowed {
            std::process::exit(1);
        }

        Ok(())
    }
}

fn report(decision: &Decision, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(decision)?);
        return Ok(());
    }

    println!("{}", if decision.allowed { "allowed" } else { "denied" });
    if let Some(message) = decision.message() {
        println!("{message}");
    }

    Ok(())
}
