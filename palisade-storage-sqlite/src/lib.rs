//! SQLite storage backend for palisade.
//!
//! Provides [`SqliteRepositoryProvider`], which bundles the SQLite attempt
//! and block repositories behind the [`RepositoryProvider`] trait so the
//! services in `palisade-core` can run against a single pool.
//!
//! Timestamps are stored as unix-epoch integers.

pub mod migrations;
pub mod repositories;

pub use repositories::{SqliteAttemptRepository, SqliteBlockRepository};

use async_trait::async_trait;
use palisade_core::{
    Error,
    error::StorageError,
    repositories::{AttemptRepositoryProvider, BlockRepositoryProvider, RepositoryProvider},
};
use palisade_migration::{Migration, MigrationManager};
use sqlx::{Sqlite, SqlitePool};

use crate::migrations::{
    CreateBlocksTable, CreateIndexes, CreateLoginAttemptsTable, SqliteMigrationManager,
};

/// Repository provider backed by a single SQLite pool.
pub struct SqliteRepositoryProvider {
    pool: SqlitePool,
    attempts: SqliteAttemptRepository,
    blocks: SqliteBlockRepository,
}

impl SqliteRepositoryProvider {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            attempts: SqliteAttemptRepository::new(pool.clone()),
            blocks: SqliteBlockRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to a SQLite database and construct a provider.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let pool = SqlitePool::connect(url).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to connect to SQLite database");
            StorageError::Connection("Failed to connect to SQLite database".to_string())
        })?;
        Ok(Self::new(pool))
    }
}

impl AttemptRepositoryProvider for SqliteRepositoryProvider {
    type AttemptRepo = SqliteAttemptRepository;

    fn attempts(&self) -> &Self::AttemptRepo {
        &self.attempts
    }
}

impl BlockRepositoryProvider for SqliteRepositoryProvider {
    type BlockRepo = SqliteBlockRepository;

    fn blocks(&self) -> &Self::BlockRepo {
        &self.blocks
    }
}

#[async_trait]
impl RepositoryProvider for SqliteRepositoryProvider {
    async fn migrate(&self) -> Result<(), Error> {
        let manager = SqliteMigrationManager::new(self.pool.clone());
        manager
            .initialize()
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        let migrations: Vec<Box<dyn Migration<Sqlite>>> = vec![
            Box::new(CreateLoginAttemptsTable),
            Box::new(CreateBlocksTable),
            Box::new(CreateIndexes),
        ];
        manager
            .up(&migrations)
            .await
            .map_err(|e| StorageError::Migration(e.to_string()))?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Health check failed");
                StorageError::Connection("Health check failed".to_string())
            })?;
        Ok(())
    }
}
