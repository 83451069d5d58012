//! Subscription entitlement checks and usage metering for AI workspaces.
//!
//! The crate is a library first: [`gate::UsageGate`] is the single decision
//! point for "may this user perform this AI, storage, or element operation
//! right now", backed by a pluggable [`store::PlanStore`] and a static
//! [`plans::PlanCatalog`]. Request handlers call the gate; billing webhooks
//! relay plan changes into it; an external scheduler drives the counter
//! resets.
//!
//! The `ugate` binary wraps the same gate for operations: ad-hoc checks,
//! plan administration, usage reporting, and the cron-driven resets.

pub mod cli;
pub mod commands;
pub mod config;
pub mod gate;
pub mod plans;
pub mod store;
pub mod types;
