//! Gate decisions and denial reasons.

use std::fmt;

use serde::Serialize;

use crate::types::UserPlanState;

/// Warning attached to a decision made while the plan store was down.
pub const DEGRADED_WARNING: &str = "Warning: Could not verify usage limits";

/// Why a request was refused.
///
/// Each reason maps 1:1 to a fixed user-facing message; callers display
/// the message verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    ModelNotAllowed,
    MonthlyLimit,
    DailyLimit,
    RateLimit,
    StorageLimit,
    ElementsLimit,
}

impl DenyReason {
    /// The fixed user-facing message for this reason.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::ModelNotAllowed => {
                "Your current plan does not have access to this AI model. Please upgrade to use this feature."
            }
            DenyReason::MonthlyLimit => {
                "You've reached your monthly AI request limit. Please upgrade your plan for additional requests."
            }
            DenyReason::DailyLimit => {
                "You've reached your daily AI request limit. Please try again tomorrow or upgrade your plan."
            }
            DenyReason::RateLimit => "Too many requests. Please wait a moment before trying again.",
            DenyReason::StorageLimit => {
                "You've reached your storage limit. Please upgrade your plan for additional storage."
            }
            DenyReason::ElementsLimit => {
                "You've reached the maximum number of world elements for your plan. Please upgrade to add more."
            }
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of an entitlement check.
///
/// Denials are data, not errors: callers branch on `allowed` and surface
/// [`Decision::message`] to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Decision {
    pub allowed: bool,
    pub reason: Option<DenyReason>,
    /// Set when the store was unreachable and the gate answered without it.
    pub degraded: bool,
    /// Snapshot of the user's state at decision time.
    pub state: UserPlanState,
}

impl Decision {
    pub(crate) fn allow(state: UserPlanState) -> Self {
        Self {
            allowed: true,
            reason: None,
            degraded: false,
            state,
        }
    }

    pub(crate) fn deny(reason: DenyReason, state: UserPlanState) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            degraded: false,
            state,
        }
    }

    pub(crate) fn degraded(state: UserPlanState) -> Self {
        Self {
            allowed: true,
            reason: None,
            degraded: true,
            state,
        }
    }

    /// User-facing message, if this decision carries one.
    pub fn message(&self) -> Option<&'static str> {
        if self.degraded {
            return Some(DEGRADED_WARNING);
        }
        self.reason.map(|reason| reason.message())
    }
}
