//! In-memory plan store.

use std::collections::HashMap;

use tokio::sync::Mutex;

use super::PlanStore;
use crate::types::{StoreError, UserPlanState};

/// Process-local store backed by a mutex-guarded map.
///
/// Holds the same records the SQLite store persists, with no durability.
/// Useful for tests and for embedding the gate where persistence is
/// handled elsewhere.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, UserPlanState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanStore for MemoryStore {
    async fn get(&self, user_id: &str) -> Result<UserPlanState, StoreError> {
        let mut users = self.users.lock().await;
        let state = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserPlanState::new(user_id));
        Ok(state.clone())
    }

    async fn put(&self, state: &UserPlanState) -> Result<(), StoreError> {
        let mut users = self.users.lock().await;
        users.insert(state.user_id.clone(), state.clone());
        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        let users = self.users.lock().await;
        Ok(users.keys().cloned().collect())
    }
}
