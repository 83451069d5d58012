//! Plan/usage stores.
//!
//! The gate never talks to a database directly; it goes through
//! [`PlanStore`], so any persistent backend can slot in without touching
//! the decision logic. Two implementations ship with the crate:
//! [`MemoryStore`] for tests and embedding, [`SqliteStore`] for real use.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::future::Future;

use crate::types::{StoreError, UserPlanState};

/// Trait for plan/usage stores.
///
/// Reads create missing users lazily; writes persist a whole user record
/// atomically. Enumeration exists so batch resets can walk every known
/// user instead of assuming a single in-process map.
pub trait PlanStore: Send + Sync {
    /// Fetch a user's state, creating the BASIC-tier default on first access.
    fn get(&self, user_id: &str) -> impl Future<Output = Result<UserPlanState, StoreError>> + Send;

    /// Persist a user's state as a single atomic write.
    fn put(&self, state: &UserPlanState) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// All user ids known to the store.
    fn list_user_ids(&self) -> impl Future<Output = Result<Vec<String>, StoreError>> + Send;
}
