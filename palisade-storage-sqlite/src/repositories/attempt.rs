//! SQLite implementation of the attempt audit trail repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use palisade_core::{
    AttemptOutcome, AttemptRecord, Error, TrackerState, error::StorageError,
    repositories::AttemptRepository,
};
use sqlx::SqlitePool;

/// SQLite repository for the append-only attempt log.
pub struct SqliteAttemptRepository {
    pool: SqlitePool,
}

impl SqliteAttemptRepository {
    /// Create a new SQLite attempt repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteAttemptRow {
    id: i64,
    identity: String,
    outcome: String,
    state: String,
    created_at: i64,
}

impl TryFrom<SqliteAttemptRow> for AttemptRecord {
    type Error = Error;

    fn try_from(row: SqliteAttemptRow) -> Result<Self, Error> {
        let outcome = AttemptOutcome::parse(&row.outcome).ok_or_else(|| {
            StorageError::Database(format!("Invalid attempt outcome: {}", row.outcome))
        })?;
        let state = TrackerState::parse(&row.state).ok_or_else(|| {
            StorageError::Database(format!("Invalid tracker state: {}", row.state))
        })?;
        let created_at = DateTime::from_timestamp(row.created_at, 0)
            .ok_or_else(|| StorageError::Database("Invalid timestamp".to_string()))?;

        Ok(AttemptRecord {
            id: row.id,
            identity: row.identity,
            outcome,
            state,
            created_at,
        })
    }
}

#[async_trait]
impl AttemptRepository for SqliteAttemptRepository {
    async fn record_attempt(
        &self,
        identity: &str,
        outcome: AttemptOutcome,
        state: TrackerState,
        at: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error> {
        let row = sqlx::query_as::<_, SqliteAttemptRow>(
            r#"
            INSERT INTO login_attempts (identity, outcome, state, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, identity, outcome, state, created_at
            "#,
        )
        .bind(identity)
        .bind(outcome.as_str())
        .bind(state.to_string())
        .bind(at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to record login attempt");
            StorageError::Database("Failed to record login attempt".to_string())
        })?;

        row.try_into()
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AttemptRecord>, Error> {
        let rows = sqlx::query_as::<_, SqliteAttemptRow>(
            r#"
            SELECT id, identity, outcome, state, created_at
            FROM login_attempts
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list recent attempts");
            StorageError::Database("Failed to list recent attempts".to_string())
        })?;

        rows.into_iter().map(AttemptRecord::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{
        CreateBlocksTable, CreateIndexes, CreateLoginAttemptsTable, SqliteMigrationManager,
    };
    use chrono::{TimeZone, Utc};
    use palisade_migration::{Migration, MigrationManager};
    use sqlx::Sqlite;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create pool");

        let manager = SqliteMigrationManager::new(pool.clone());
        manager
            .initialize()
            .await
            .expect("Failed to initialize migrations");

        let migrations: Vec<Box<dyn Migration<Sqlite>>> = vec![
            Box::new(CreateLoginAttemptsTable),
            Box::new(CreateBlocksTable),
            Box::new(CreateIndexes),
        ];
        manager
            .up(&migrations)
            .await
            .expect("Failed to run migrations");

        pool
    }

    fn at(seconds: i64) -> chrono::DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn test_record_attempt() {
        let pool = setup_test_db().await;
        let repo = SqliteAttemptRepository::new(pool);

        let record = repo
            .record_attempt(
                "192.168.1.1",
                AttemptOutcome::Failed,
                TrackerState::Counting(1),
                at(0),
            )
            .await
            .expect("Failed to record attempt");

        assert!(record.id > 0);
        assert_eq!(record.identity, "192.168.1.1");
        assert_eq!(record.outcome, AttemptOutcome::Failed);
        assert_eq!(record.state, TrackerState::Counting(1));
        assert_eq!(record.created_at, at(0));
    }

    #[tokio::test]
    async fn test_outcome_and_state_survive_storage() {
        let pool = setup_test_db().await;
        let repo = SqliteAttemptRepository::new(pool);

        repo.record_attempt(
            "10.0.0.1",
            AttemptOutcome::BlockedTry,
            TrackerState::Blocked,
            at(0),
        )
        .await
        .unwrap();

        let recent = repo.list_recent(1).await.unwrap();
        assert_eq!(recent[0].outcome, AttemptOutcome::BlockedTry);
        assert_eq!(recent[0].state, TrackerState::Blocked);
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_limits() {
        let pool = setup_test_db().await;
        let repo = SqliteAttemptRepository::new(pool);

        for t in 0..5 {
            repo.record_attempt(
                &format!("10.0.0.{t}"),
                AttemptOutcome::Failed,
                TrackerState::Counting(1),
                at(t),
            )
            .await
            .unwrap();
        }

        let recent = repo.list_recent(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].identity, "10.0.0.4");
        assert_eq!(recent[1].identity, "10.0.0.3");
        assert_eq!(recent[2].identity, "10.0.0.2");
    }

    #[tokio::test]
    async fn test_list_recent_ties_broken_by_id() {
        let pool = setup_test_db().await;
        let repo = SqliteAttemptRepository::new(pool);

        // Same second for both rows; insertion order must still win.
        repo.record_attempt("a", AttemptOutcome::Failed, TrackerState::Counting(1), at(0))
            .await
            .unwrap();
        repo.record_attempt("b", AttemptOutcome::Failed, TrackerState::Counting(2), at(0))
            .await
            .unwrap();

        let recent = repo.list_recent(10).await.unwrap();
        assert_eq!(recent[0].identity, "b");
        assert_eq!(recent[1].identity, "a");
    }
}
