//! The entitlement gate.
//!
//! Single decision point for "may this user perform this AI, storage, or
//! element operation right now", and the recorder of usage once permitted.
//!
//! [`UsageGate::check_ai_usage`] runs its checks in a fixed order - model,
//! monthly ceiling, daily ceiling, 60-second rate window, element count -
//! with first-failure-wins and no partial side effects on denial. A
//! per-user lock is held across the read-evaluate-write so concurrent
//! requests for the same user cannot slip past a ceiling together.
//!
//! When the backing store fails, the gate fails open by default: the
//! request is allowed with a degraded-mode warning, and the occurrence is
//! logged for audit. Availability of the creative feature outranks strict
//! quota enforcement; `fail_closed` flips that trade-off.

mod decision;

pub use decision::{DEGRADED_WARNING, Decision, DenyReason};

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::plans::PlanCatalog;
use crate::store::PlanStore;
use crate::types::{
    OperationKind, PlanTier, StoreError, SubscriptionStatus, UsageEvent, UserPlanState,
};

/// Width of the rate-limiting window, in seconds.
const RATE_WINDOW_SECS: i64 = 60;

/// The usage-entitlement gate.
///
/// Generic over the backing [`PlanStore`]; the plan-entitlement table is
/// fixed at construction and never changes at runtime.
pub struct UsageGate<S> {
    store: S,
    plans: PlanCatalog,
    fail_open: bool,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S: PlanStore> UsageGate<S> {
    pub fn new(store: S, plans: PlanCatalog) -> Self {
        Self {
            store,
            plans,
            fail_open: true,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Propagate store failures instead of allowing requests unchecked.
    pub fn fail_closed(mut self) -> Self {
        self.fail_open = false;
        self
    }

    /// Access the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The entitlement table this gate was built with.
    pub fn plans(&self) -> &PlanCatalog {
        &self.plans
    }

    /// The lock serializing updates for one user.
    async fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(user_id.to_string()).or_default().clone()
    }

    /// Apply the failure policy to a store error.
    fn store_failure(&self, user_id: &str, err: StoreError) -> Result<Decision, StoreError> {
        if self.fail_open {
            warn!(user = user_id, error = %err, "plan store unavailable, allowing request unchecked");
            Ok(Decision::degraded(UserPlanState::new(user_id)))
        } else {
            Err(err)
        }
    }

    /// Check an AI request against the user's plan and, if allowed, record it.
    ///
    /// Checks run in order and the first failure wins; a denied request
    /// leaves the user's counters untouched. An allowed request appends a
    /// usage event and bumps the monthly/daily/token counters before the
    /// decision is returned.
    pub async fn check_ai_usage(
        &self,
        user_id: &str,
        model: &str,
        operation: OperationKind,
        token_estimate: u64,
    ) -> Result<Decision, StoreError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut state = match self.store.get(user_id).await {
            Ok(state) => state,
            Err(err) => return self.store_failure(user_id, err),
        };

        let plan = self.plans.get(state.plan);

        if !plan.allows_model(model) {
            debug!(user = user_id, model, plan = %state.plan, "model not in plan");
            return Ok(Decision::deny(DenyReason::ModelNotAllowed, state));
        }

        if plan.requests_per_month.reached(state.usage.monthly_requests) {
            debug!(user = user_id, used = state.usage.monthly_requests, "monthly ceiling");
            return Ok(Decision::deny(DenyReason::MonthlyLimit, state));
        }

        if plan.requests_per_day.reached(state.usage.daily_requests) {
            debug!(user = user_id, used = state.usage.daily_requests, "daily ceiling");
            return Ok(Decision::deny(DenyReason::DailyLimit, state));
        }

        let cutoff = Utc::now() - Duration::seconds(RATE_WINDOW_SECS);
        let in_window = state.usage.requests_since(cutoff) as u64;
        if plan.requests_per_minute.reached(in_window) {
            debug!(user = user_id, in_window, "rate window full");
            return Ok(Decision::deny(DenyReason::RateLimit, state));
        }

        if operation == OperationKind::Generate
            && plan.max_elements.reached(state.element_count)
        {
            debug!(user = user_id, elements = state.element_count, "element ceiling");
            return Ok(Decision::deny(DenyReason::ElementsLimit, state));
        }

        state
            .usage
            .record(UsageEvent::now(operation, model, token_estimate));

        if let Err(err) = self.store.put(&state).await {
            return self.store_failure(user_id, err);
        }

        debug!(user = user_id, model, operation = %operation, "request recorded");
        Ok(Decision::allow(state))
    }

    /// Check whether adding `additional_bytes` would fit in the storage
    /// ceiling. No side effects: the caller reports the new total with
    /// [`UsageGate::record_storage_usage`] after the upload succeeds, so a
    /// failed upload is never counted.
    pub async fn check_storage_usage(
        &self,
        user_id: &str,
        additional_bytes: u64,
    ) -> Result<Decision, StoreError> {
        let state = match self.store.get(user_id).await {
            Ok(state) => state,
            Err(err) => return self.store_failure(user_id, err),
        };

        let plan = self.plans.get(state.plan);
        let projected = state.usage.storage_used.saturating_add(additional_bytes);

        if plan.storage_limit.exceeded_by(projected) {
            return Ok(Decision::deny(DenyReason::StorageLimit, state));
        }

        Ok(Decision::allow(state))
    }

    /// Check whether creating `additional_elements` more world elements
    /// would fit in the plan ceiling. No side effects.
    pub async fn check_element_limit(
        &self,
        user_id: &str,
        additional_elements: u64,
    ) -> Result<Decision, StoreError> {
        let state = match self.store.get(user_id).await {
            Ok(state) => state,
            Err(err) => return self.store_failure(user_id, err),
        };

        let plan = self.plans.get(state.plan);
        let projected = state.element_count.saturating_add(additional_elements);

        if plan.max_elements.exceeded_by(projected) {
            return Ok(Decision::deny(DenyReason::ElementsLimit, state));
        }

        Ok(Decision::allow(state))
    }

    /// Look up a user's plan and usage, creating the default state on
    /// first access.
    pub async fn plan_info(&self, user_id: &str) -> Result<UserPlanState, StoreError> {
        self.store.get(user_id).await
    }

    /// Overwrite a user's plan, subscription id, and status.
    ///
    /// Unconditional by design: transition legality is the billing
    /// webhook's responsibility, the gate is a state sink here.
    pub async fn set_plan(
        &self,
        user_id: &str,
        plan: PlanTier,
        subscription_id: Option<String>,
        status: SubscriptionStatus,
    ) -> Result<(), StoreError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut state = self.store.get(user_id).await?;
        state.plan = plan;
        state.subscription_id = subscription_id;
        state.status = status;
        self.store.put(&state).await?;

        info!(user = user_id, plan = %plan, status = %status, "plan updated");
        Ok(())
    }

    /// Set the user's storage total to the caller-reported value.
    /// Called after uploads and deletes commit; the caller owns correctness.
    pub async fn record_storage_usage(
        &self,
        user_id: &str,
        total_bytes: u64,
    ) -> Result<(), StoreError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut state = self.store.get(user_id).await?;
        state.usage.storage_used = total_bytes;
        self.store.put(&state).await?;

        debug!(user = user_id, total_bytes, "storage total recorded");
        Ok(())
    }

    /// Set the user's world-element count to the caller-reported value.
    pub async fn record_element_count(&self, user_id: &str, count: u64) -> Result<(), StoreError> {
        let lock = self.user_lock(user_id).await;
        let _guard = lock.lock().await;

        let mut state = self.store.get(user_id).await?;
        state.element_count = count;
        self.store.put(&state).await?;

        debug!(user = user_id, count, "element count recorded");
        Ok(())
    }

    /// Zero every user's daily request counter. Monthly counters are left
    /// alone. Invoked by an external scheduler at midnight.
    pub async fn reset_daily(&self) -> Result<usize, StoreError> {
        let ids = self.store.list_user_ids().await?;

        for id in &ids {
            let lock = self.user_lock(id).await;
            let _guard = lock.lock().await;

            let mut state = self.store.get(id).await?;
            state.usage.daily_requests = 0;
            self.store.put(&state).await?;
        }

        info!(users = ids.len(), "daily usage counters reset");
        Ok(ids.len())
    }

    /// Zero every user's monthly request and cumulative token counters.
    /// Daily counters are left alone. Invoked on the first of the month.
    pub async fn reset_monthly(&self) -> Result<usize, StoreError> {
        let ids = self.store.list_user_ids().await?;

        for id in &ids {
            let lock = self.user_lock(id).await;
            let _guard = lock.lock().await;

            let mut state = self.store.get(id).await?;
            state.usage.monthly_requests = 0;
            state.usage.tokens_used = 0;
            self.store.put(&state).await?;
        }

        info!(users = ids.len(), "monthly usage counters reset");
        Ok(ids.len())
    }
}
