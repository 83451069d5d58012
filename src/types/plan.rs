//! Per-user plan and usage state.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UsageEvent;

/// How many events the recent-events log retains per user.
///
/// Eviction is FIFO on insert, not time-based; the rate check applies its
/// own 60-second window filter at read time.
pub const RECENT_EVENTS_CAP: usize = 100;

/// Subscription plan tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Basic,
    Pro,
    Enterprise,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Basic => "basic",
            PlanTier::Pro => "pro",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(PlanTier::Basic),
            "pro" => Ok(PlanTier::Pro),
            "enterprise" => Ok(PlanTier::Enterprise),
            other => Err(format!("unknown plan tier: {other}")),
        }
    }
}

/// Subscription status, as relayed by the billing webhook.
///
/// No transition table is enforced: any status may follow any other,
/// because legality of a transition is the billing collaborator's problem.
/// `Canceled` is terminal in practice, but re-activation is permitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Trialing,
    PastDue,
    Canceled,
    Incomplete,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Trialing => "trialing",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Canceled => "canceled",
            SubscriptionStatus::Incomplete => "incomplete",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SubscriptionStatus::Active),
            "trialing" => Ok(SubscriptionStatus::Trialing),
            "past_due" => Ok(SubscriptionStatus::PastDue),
            "canceled" => Ok(SubscriptionStatus::Canceled),
            "incomplete" => Ok(SubscriptionStatus::Incomplete),
            other => Err(format!("unknown subscription status: {other}")),
        }
    }
}

/// Request and resource counters for one user.
///
/// The request/token counters only grow between resets; the daily and
/// monthly resets are the only operations that zero them. `storage_used`
/// is a caller-reported total, set wholesale after uploads and deletes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageCounters {
    pub monthly_requests: u64,
    pub daily_requests: u64,
    pub tokens_used: u64,
    pub storage_used: u64,
    pub recent_events: VecDeque<UsageEvent>,
}

impl UsageCounters {
    /// Record one allowed request: bump the counters and append the event,
    /// evicting the oldest entry once the log is at capacity.
    pub fn record(&mut self, event: UsageEvent) {
        self.monthly_requests += 1;
        self.daily_requests += 1;
        self.tokens_used += event.tokens;
        self.recent_events.push_back(event);
        while self.recent_events.len() > RECENT_EVENTS_CAP {
            self.recent_events.pop_front();
        }
    }

    /// Number of recorded events strictly newer than `cutoff`.
    pub fn requests_since(&self, cutoff: DateTime<Utc>) -> usize {
        self.recent_events
            .iter()
            .filter(|event| event.timestamp > cutoff)
            .count()
    }
}

/// Everything the gate knows about one user.
///
/// Created lazily with BASIC-tier defaults on first access; exactly one
/// per user id. The gate never deletes these - account deletion is an
/// external lifecycle concern. `element_count` is the caller-reported
/// authoritative count, set wholesale rather than incremented here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPlanState {
    pub user_id: String,
    pub plan: PlanTier,
    /// Billing-provider subscription id; `None` means no paid subscription.
    pub subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub element_count: u64,
    pub usage: UsageCounters,
}

impl UserPlanState {
    /// Default state for a user seen for the first time.
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            plan: PlanTier::Basic,
            subscription_id: None,
            status: SubscriptionStatus::Active,
            element_count: 0,
            usage: UsageCounters::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OperationKind;

    #[test]
    fn test_new_user_defaults() {
        let state = UserPlanState::new("u1");
        assert_eq!(state.plan, PlanTier::Basic);
        assert_eq!(state.status, SubscriptionStatus::Active);
        assert!(state.subscription_id.is_none());
        assert_eq!(state.element_count, 0);
        assert_eq!(state.usage.monthly_requests, 0);
        assert!(state.usage.recent_events.is_empty());
    }

    #[test]
    fn test_record_bumps_counters() {
        let mut counters = UsageCounters::default();
        counters.record(UsageEvent::now(OperationKind::Generate, "gpt-4o-mini", 120));
        counters.record(UsageEvent::now(OperationKind::Stream, "gpt-4o-mini", 80));

        assert_eq!(counters.monthly_requests, 2);
        assert_eq!(counters.daily_requests, 2);
        assert_eq!(counters.tokens_used, 200);
        assert_eq!(counters.recent_events.len(), 2);
    }

    #[test]
    fn test_recent_events_capped_fifo() {
        let mut counters = UsageCounters::default();
        for i in 0..(RECENT_EVENTS_CAP + 25) {
            counters.record(UsageEvent::now(
                OperationKind::Generate,
                format!("model-{i}"),
                0,
            ));
        }

        assert_eq!(counters.recent_events.len(), RECENT_EVENTS_CAP);
        // The 25 oldest entries were evicted, insertion order preserved.
        assert_eq!(counters.recent_events.front().unwrap().model, "model-25");
        assert_eq!(
            counters.recent_events.back().unwrap().model,
            format!("model-{}", RECENT_EVENTS_CAP + 24)
        );
    }

    #[test]
    fn test_requests_since_filters_by_timestamp() {
        let mut counters = UsageCounters::default();
        let mut old = UsageEvent::now(OperationKind::Generate, "gpt-4o-mini", 0);
        old.timestamp = Utc::now() - chrono::Duration::seconds(90);
        counters.record(old);
        counters.record(UsageEvent::now(OperationKind::Generate, "gpt-4o-mini", 0));

        let cutoff = Utc::now() - chrono::Duration::seconds(60);
        assert_eq!(counters.requests_since(cutoff), 1);
    }

    #[test]
    fn test_tier_and_status_parse() {
        assert_eq!("pro".parse::<PlanTier>().unwrap(), PlanTier::Pro);
        assert!("platinum".parse::<PlanTier>().is_err());
        assert_eq!(
            "past_due".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::PastDue
        );
        assert!("paused".parse::<SubscriptionStatus>().is_err());
    }
}
