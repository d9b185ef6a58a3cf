//! Versioned schema migrations for palisade storage backends.
//!
//! A backend defines its schema as a list of [`Migration`] trait objects and
//! applies them through a [`MigrationManager`], which records applied
//! versions in a tracking table so migrations run exactly once.

use async_trait::async_trait;
use sqlx::Database;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Migration(String),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

/// One reversible schema change.
#[async_trait]
pub trait Migration<DB: Database>: Send + Sync {
    /// Apply the schema change
    async fn up<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Undo the schema change
    async fn down<'a>(&'a self, conn: &'a mut <DB as Database>::Connection) -> Result<()>;

    /// Ordering key; migrations apply in ascending version order
    fn version(&self) -> i64;

    /// Name recorded in the tracking table
    fn name(&self) -> &str;
}

/// Applies and rolls back [`Migration`] lists against one backend.
#[async_trait]
pub trait MigrationManager<DB: Database>: Send + Sync {
    /// Table recording which versions have been applied
    fn migration_table_name(&self) -> &str {
        "_palisade_migrations"
    }

    /// Create the tracking table if missing
    async fn initialize(&self) -> Result<()>;

    /// Apply every migration not yet recorded
    async fn up(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Roll back every applied migration in the list
    async fn down(&self, migrations: &[Box<dyn Migration<DB>>]) -> Result<()>;

    /// Whether `version` has been applied
    async fn is_applied(&self, version: i64) -> Result<bool>;
}
