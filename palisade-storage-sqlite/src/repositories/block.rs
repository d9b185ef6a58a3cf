//! SQLite implementation of the block repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use palisade_core::{Block, Error, error::StorageError, repositories::BlockRepository};
use sqlx::SqlitePool;

/// SQLite repository for block records.
pub struct SqliteBlockRepository {
    pool: SqlitePool,
}

impl SqliteBlockRepository {
    /// Create a new SQLite block repository.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Internal struct for query results
#[derive(Debug, sqlx::FromRow)]
struct SqliteBlockRow {
    id: i64,
    identity: String,
    blocked_until: i64,
    reason: String,
    created_at: i64,
}

impl TryFrom<SqliteBlockRow> for Block {
    type Error = Error;

    fn try_from(row: SqliteBlockRow) -> Result<Self, Error> {
        let blocked_until = DateTime::from_timestamp(row.blocked_until, 0)
            .ok_or_else(|| StorageError::Database("Invalid timestamp".to_string()))?;
        let created_at = DateTime::from_timestamp(row.created_at, 0)
            .ok_or_else(|| StorageError::Database("Invalid timestamp".to_string()))?;

        Ok(Block {
            id: row.id,
            identity: row.identity,
            blocked_until,
            reason: row.reason,
            created_at,
        })
    }
}

#[async_trait]
impl BlockRepository for SqliteBlockRepository {
    async fn create_block(
        &self,
        identity: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Block, Error> {
        let row = sqlx::query_as::<_, SqliteBlockRow>(
            r#"
            INSERT INTO blocks (identity, blocked_until, reason, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, identity, blocked_until, reason, created_at
            "#,
        )
        .bind(identity)
        .bind(blocked_until.timestamp())
        .bind(reason)
        .bind(at.timestamp())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create block");
            StorageError::Database("Failed to create block".to_string())
        })?;

        row.try_into()
    }

    async fn get_active_block(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Block>, Error> {
        let row = sqlx::query_as::<_, SqliteBlockRow>(
            r#"
            SELECT id, identity, blocked_until, reason, created_at
            FROM blocks
            WHERE identity = ? AND blocked_until > ?
            ORDER BY blocked_until DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(identity)
        .bind(now.timestamp())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to get active block");
            StorageError::Database("Failed to get active block".to_string())
        })?;

        row.map(Block::try_from).transpose()
    }

    async fn list_active_blocks(&self, now: DateTime<Utc>) -> Result<Vec<Block>, Error> {
        let rows = sqlx::query_as::<_, SqliteBlockRow>(
            r#"
            SELECT id, identity, blocked_until, reason, created_at
            FROM blocks
            WHERE blocked_until > ?
            ORDER BY blocked_until DESC, id DESC
            "#,
        )
        .bind(now.timestamp())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to list active blocks");
            StorageError::Database("Failed to list active blocks".to_string())
        })?;

        rows.into_iter().map(Block::try_from).collect()
    }

    async fn delete_block(&self, id: i64) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM blocks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to delete block");
                StorageError::Database("Failed to delete block".to_string())
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        let result = sqlx::query("DELETE FROM blocks WHERE blocked_until <= ?")
            .bind(before.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to cleanup expired blocks");
                StorageError::Database("Failed to cleanup expired blocks".to_string())
            })?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::{
        CreateBlocksTable, CreateIndexes, CreateLoginAttemptsTable, SqliteMigrationManager,
    };
    use chrono::TimeZone;
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

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_active_block() {
        let pool = setup_test_db().await;
        let repo = SqliteBlockRepository::new(pool);

        let block = repo
            .create_block("10.0.0.1", at(300), "threshold_exceeded", at(0))
            .await
            .expect("Failed to create block");
        assert!(block.id > 0);
        assert_eq!(block.blocked_until, at(300));
        assert_eq!(block.reason, "threshold_exceeded");

        let active = repo.get_active_block("10.0.0.1", at(100)).await.unwrap();
        assert_eq!(active, Some(block));

        let other = repo.get_active_block("10.0.0.2", at(100)).await.unwrap();
        assert!(other.is_none());
    }

    #[tokio::test]
    async fn test_expired_block_is_ignored() {
        let pool = setup_test_db().await;
        let repo = SqliteBlockRepository::new(pool);

        repo.create_block("10.0.0.1", at(300), "threshold_exceeded", at(0))
            .await
            .unwrap();

        // Active strictly before expiry, gone exactly at it.
        assert!(repo.get_active_block("10.0.0.1", at(299)).await.unwrap().is_some());
        assert!(repo.get_active_block("10.0.0.1", at(300)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overlapping_blocks_return_latest_expiry() {
        let pool = setup_test_db().await;
        let repo = SqliteBlockRepository::new(pool);

        repo.create_block("10.0.0.1", at(300), "first", at(0))
            .await
            .unwrap();
        let longer = repo
            .create_block("10.0.0.1", at(600), "second", at(10))
            .await
            .unwrap();

        let active = repo.get_active_block("10.0.0.1", at(100)).await.unwrap();
        assert_eq!(active.unwrap().id, longer.id);
    }

    #[tokio::test]
    async fn test_list_active_blocks_ordered() {
        let pool = setup_test_db().await;
        let repo = SqliteBlockRepository::new(pool);

        repo.create_block("10.0.0.1", at(300), "a", at(0))
            .await
            .unwrap();
        repo.create_block("10.0.0.2", at(500), "b", at(0))
            .await
            .unwrap();
        repo.create_block("10.0.0.3", at(100), "c", at(0))
            .await
            .unwrap();

        let active = repo.list_active_blocks(at(200)).await.unwrap();
        // The t=100 block is already expired at t=200.
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].identity, "10.0.0.2");
        assert_eq!(active[1].identity, "10.0.0.1");
    }

    #[tokio::test]
    async fn test_delete_block() {
        let pool = setup_test_db().await;
        let repo = SqliteBlockRepository::new(pool);

        let block = repo
            .create_block("10.0.0.1", at(300), "threshold_exceeded", at(0))
            .await
            .unwrap();

        assert!(repo.delete_block(block.id).await.unwrap());
        assert!(repo.get_active_block("10.0.0.1", at(1)).await.unwrap().is_none());

        assert!(!repo.delete_block(block.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_expired_keeps_active_blocks() {
        let pool = setup_test_db().await;
        let repo = SqliteBlockRepository::new(pool);

        repo.create_block("10.0.0.1", at(100), "old", at(0))
            .await
            .unwrap();
        repo.create_block("10.0.0.2", at(900), "active", at(0))
            .await
            .unwrap();

        let deleted = repo.cleanup_expired(at(200)).await.unwrap();
        assert_eq!(deleted, 1);

        let active = repo.list_active_blocks(at(200)).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].identity, "10.0.0.2");
    }
}
