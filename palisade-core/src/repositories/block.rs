//! Repository trait for block records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, block::Block};

/// Insert-and-delete store of identity blocks.
///
/// Block rows are never updated after creation. Overlapping active blocks
/// for one identity may coexist; queries that return a single block must
/// pick the one with the latest `blocked_until`, which covers the union of
/// the overlapping intervals and keeps the selection deterministic.
#[async_trait]
pub trait BlockRepository: Send + Sync + 'static {
    /// Insert a new block row. Always succeeds; existing active blocks for
    /// the same identity are not merged or deduplicated.
    async fn create_block(
        &self,
        identity: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Block, Error>;

    /// The active block with the latest expiry for `identity`, if any.
    async fn get_active_block(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Block>, Error>;

    /// All currently active blocks, most recent expiry first.
    async fn list_active_blocks(&self, now: DateTime<Utc>) -> Result<Vec<Block>, Error>;

    /// Delete a block row by id, active or not.
    ///
    /// # Returns
    ///
    /// Whether a row existed. An unknown id is `Ok(false)`, not an error.
    async fn delete_block(&self, id: i64) -> Result<bool, Error>;

    /// Delete expired rows with `blocked_until` at or before `before`.
    ///
    /// Housekeeping only: enforcement filters expired blocks at read time
    /// and never depends on this running.
    ///
    /// # Returns
    ///
    /// The number of rows deleted.
    async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, Error>;
}
