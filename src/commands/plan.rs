//! Plan command - show or overwrite a user's plan.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::types::{Limit, PlanTier, SubscriptionStatus};

use super::open_gate;

#[derive(Args)]
pub struct PlanCmd {
    #[command(subcommand)]
    action: PlanAction,
}

#[derive(Subcommand)]
enum PlanAction {
    /// Show a user's plan, status, and usage against the plan ceilings
    Show {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Print the state as JSON
        #[arg(long)]
        json: bool,
    },

    /// Overwrite a user's plan (the billing-webhook relay path)
    Set {
        /// User identifier
        #[arg(long)]
        user: String,

        /// Plan tier: basic, pro, or enterprise
        #[arg(long)]
        tier: PlanTier,

        /// Billing-provider subscription id
        #[arg(long)]
        subscription: Option<String>,

        /// Subscription status: active, trialing, past_due, canceled, incomplete
        #[arg(long, default_value = "active")]
        status: SubscriptionStatus,
    },
}

impl PlanCmd {
    pub async fn run(&self) -> Result<()> {
        let gate = open_gate().await?;

        match &self.action {
            PlanAction::Show { user, json } => {
                let state = gate.plan_info(user).await?;

                if *json {
                    println!("{}", serde_json::to_string_pretty(&state)?);
                    return Ok(());
                }

                let plan = gate.plans().get(state.plan);

                println!("User:          {}", state.user_id);
                println!("Plan:          {} ({})", plan.name, state.plan);
                println!("Status:        {}", state.status);
                println!(
                    "Subscription:  {}",
                    state.subscription_id.as_deref().unwrap_or("-")
                );
                println!();
                println!(
                    "Requests this month:  {} / {}",
                    state.usage.monthly_requests, plan.requests_per_month
                );
                println!(
                    "Requests today:       {} / {}",
                    state.usage.daily_requests, plan.requests_per_day
                );
                println!("Tokens used:          {}", state.usage.tokens_used);
                println!(
                    "Storage:              {} / {}",
                    format_size(state.usage.storage_used),
                    format_limit_size(plan.storage_limit)
                );
                println!(
                    "Elements:             {} / {}",
                    state.element_count, plan.max_elements
                );
            }
            PlanAction::Set {
                user,
                tier,
                subscription,
                status,
            } => {
                gate.set_plan(user, *tier, subscription.clone(), *status)
                    .await?;

                println!("{user} updated to plan {tier} ({status})");
            }
        }

        Ok(())
    }
}

fn format_limit_size(limit: Limit) -> String {
    match limit {
        Limit::Limited(bytes) => format_size(bytes),
        Limit::Unlimited => "unlimited".to_string(),
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
