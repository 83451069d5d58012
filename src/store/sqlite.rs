//! SQLite-backed plan store.

use std::collections::VecDeque;
use std::path::Path;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, SqlitePool};

use super::PlanStore;
use crate::types::{StoreError, UsageCounters, UsageEvent, UserPlanState};

/// Durable store: one row per user plus an ordered event log.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open or create the database at the given path.
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Run database migrations.
    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_plans (
                user_id TEXT PRIMARY KEY,
                plan TEXT NOT NULL,
                subscription_id TEXT,
                status TEXT NOT NULL,
                element_count INTEGER NOT NULL,
                monthly_requests INTEGER NOT NULL,
                daily_requests INTEGER NOT NULL,
                tokens_used INTEGER NOT NULL,
                storage_used INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usage_events (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                operation TEXT NOT NULL,
                model TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                tokens INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES user_plans(user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_usage_events_user ON usage_events(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

impl PlanStore for SqliteStore {
    async fn get(&self, user_id: &str) -> Result<UserPlanState, StoreError> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM user_plans WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            // First access: persist the default so batch resets see this user.
            let state = UserPlanState::new(user_id);
            sqlx::query(
                r#"
                INSERT INTO user_plans (
                    user_id, plan, subscription_id, status, element_count,
                    monthly_requests, daily_requests, tokens_used, storage_used
                ) VALUES (?, ?, ?, ?, 0, 0, 0, 0, 0)
                ON CONFLICT(user_id) DO NOTHING
                "#,
            )
            .bind(&state.user_id)
            .bind(state.plan.as_str())
            .bind(&state.subscription_id)
            .bind(state.status.as_str())
            .execute(&self.pool)
            .await?;

            return Ok(state);
        };

        // rowid keeps insertion order, which the rate window relies on.
        let event_rows = sqlx::query_as::<_, EventRow>(
            "SELECT operation, model, timestamp, tokens FROM usage_events \
             WHERE user_id = ? ORDER BY rowid ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut recent_events = VecDeque::with_capacity(event_rows.len());
        for event_row in event_rows {
            recent_events.push_back(event_row.into_event()?);
        }

        row.into_state(recent_events)
    }

    async fn put(&self, state: &UserPlanState) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_plans (
                user_id, plan, subscription_id, status, element_count,
                monthly_requests, daily_requests, tokens_used, storage_used
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                plan = excluded.plan,
                subscription_id = excluded.subscription_id,
                status = excluded.status,
                element_count = excluded.element_count,
                monthly_requests = excluded.monthly_requests,
                daily_requests = excluded.daily_requests,
                tokens_used = excluded.tokens_used,
                storage_used = excluded.storage_used
            "#,
        )
        .bind(&state.user_id)
        .bind(state.plan.as_str())
        .bind(&state.subscription_id)
        .bind(state.status.as_str())
        .bind(state.element_count as i64)
        .bind(state.usage.monthly_requests as i64)
        .bind(state.usage.daily_requests as i64)
        .bind(state.usage.tokens_used as i64)
        .bind(state.usage.storage_used as i64)
        .execute(&mut *tx)
        .await?;

        // The log is small (capped), so rewrite it rather than diffing.
        sqlx::query("DELETE FROM usage_events WHERE user_id = ?")
            .bind(&state.user_id)
            .execute(&mut *tx)
            .await?;

        for event in &state.usage.recent_events {
            sqlx::query(
                "INSERT INTO usage_events (id, user_id, operation, model, timestamp, tokens) \
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(uuid::Uuid::new_v4().to_string())
            .bind(&state.user_id)
            .bind(event.operation.as_str())
            .bind(&event.model)
            .bind(event.timestamp.to_rfc3339())
            .bind(event.tokens as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<String>, StoreError> {
        let mut rows = sqlx::query_scalar::<_, String>("SELECT user_id FROM user_plans")
            .fetch(&self.pool);

        let mut ids = Vec::new();
        while let Some(id) = rows.try_next().await? {
            ids.push(id);
        }

        Ok(ids)
    }
}

/// A user row from the plan store.
#[derive(Debug, FromRow)]
struct UserRow {
    user_id: String,
    plan: String,
    subscription_id: Option<String>,
    status: String,
    element_count: i64,
    monthly_requests: i64,
    daily_requests: i64,
    tokens_used: i64,
    storage_used: i64,
}

impl UserRow {
    fn into_state(self, recent_events: VecDeque<UsageEvent>) -> Result<UserPlanState, StoreError> {
        let plan = self
            .plan
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("plan tier: {}", self.plan)))?;
        let status = self
            .status
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("subscription status: {}", self.status)))?;

        Ok(UserPlanState {
            user_id: self.user_id,
            plan,
            subscription_id: self.subscription_id,
            status,
            element_count: self.element_count as u64,
            usage: UsageCounters {
                monthly_requests: self.monthly_requests as u64,
                daily_requests: self.daily_requests as u64,
                tokens_used: self.tokens_used as u64,
                storage_used: self.storage_used as u64,
                recent_events,
            },
        })
    }
}

/// An event row from the usage log.
#[derive(Debug, FromRow)]
struct EventRow {
    operation: String,
    model: String,
    timestamp: String,
    tokens: i64,
}

impl EventRow {
    fn into_event(self) -> Result<UsageEvent, StoreError> {
        let operation = self
            .operation
            .parse()
            .map_err(|_| StoreError::CorruptRow(format!("operation: {}", self.operation)))?;
        let timestamp = DateTime::parse_from_rfc3339(&self.timestamp)
            .map_err(|_| StoreError::CorruptRow(format!("timestamp: {}", self.timestamp)))?
            .with_timezone(&Utc);

        Ok(UsageEvent {
            operation,
            model: self.model,
            timestamp,
            tokens: self.tokens as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OperationKind, PlanTier, SubscriptionStatus};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_get_creates_and_persists_default() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("usage.sqlite")).await.unwrap();

        let state = store.get("u1").await.unwrap();
        assert_eq!(state.plan, PlanTier::Basic);
        assert_eq!(state.status, SubscriptionStatus::Active);
        assert!(state.subscription_id.is_none());

        // The lazily created row is visible to enumeration.
        let ids = store.list_user_ids().await.unwrap();
        assert_eq!(ids, vec!["u1".to_string()]);
    }

    #[tokio::test]
    async fn test_put_then_get_round_trips_events_in_order() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("usage.sqlite")).await.unwrap();

        let mut state = store.get("u1").await.unwrap();
        state.plan = PlanTier::Pro;
        state.subscription_id = Some("sub_123".to_string());
        state.status = SubscriptionStatus::Trialing;
        state.element_count = 42;
        state.usage.record(UsageEvent::now(OperationKind::Generate, "gpt-4o-mini", 100));
        state.usage.record(UsageEvent::now(OperationKind::Stream, "gpt-4o", 250));
        store.put(&state).await.unwrap();

        let fetched = store.get("u1").await.unwrap();
        assert_eq!(fetched.plan, PlanTier::Pro);
        assert_eq!(fetched.subscription_id.as_deref(), Some("sub_123"));
        assert_eq!(fetched.status, SubscriptionStatus::Trialing);
        assert_eq!(fetched.element_count, 42);
        assert_eq!(fetched.usage.monthly_requests, 2);
        assert_eq!(fetched.usage.tokens_used, 350);

        let models: Vec<_> = fetched
            .usage
            .recent_events
            .iter()
            .map(|event| event.model.as_str())
            .collect();
        assert_eq!(models, vec!["gpt-4o-mini", "gpt-4o"]);
    }

    #[tokio::test]
    async fn test_put_rewrites_event_log() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("usage.sqlite")).await.unwrap();

        let mut state = store.get("u1").await.unwrap();
        state.usage.record(UsageEvent::now(OperationKind::Generate, "gpt-4o-mini", 10));
        store.put(&state).await.unwrap();

        state.usage.record(UsageEvent::now(OperationKind::Analyze, "gpt-4o-mini", 20));
        store.put(&state).await.unwrap();

        let fetched = store.get("u1").await.unwrap();
        assert_eq!(fetched.usage.recent_events.len(), 2);
        assert_eq!(fetched.usage.tokens_used, 30);
    }

    #[tokio::test]
    async fn test_list_user_ids_covers_all_users() {
        let dir = tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("usage.sqlite")).await.unwrap();

        store.get("a").await.unwrap();
        store.get("b").await.unwrap();

        let mut ids = store.list_user_ids().await.unwrap();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
